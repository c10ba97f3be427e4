// ABOUTME: Tracing subscriber setup for text or JSON logs on stdout or a file
// ABOUTME: RUST_LOG overrides the configured level when present
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{AppError, AppResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber
///
/// # Errors
///
/// Returns a config error if the filter is invalid, the log file cannot be
/// opened, or a subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let filter = build_filter(&config.level)?;

    let layer: BoxedLayer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::config(format!("Failed to create log directory: {e}"))
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::config(format!("Failed to open log file {}: {e}", path.display()))
                })?;
            let writer = Mutex::new(file);
            match config.format {
                LogFormat::Json => fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(writer)
                    .with_filter(filter)
                    .boxed(),
                LogFormat::Text => fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter)
                    .boxed(),
            }
        }
        None => match config.format {
            LogFormat::Json => fmt::layer()
                .json()
                .flatten_event(true)
                .with_filter(filter)
                .boxed(),
            LogFormat::Text => fmt::layer().with_target(true).with_filter(filter).boxed(),
        },
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| AppError::config(format!("Failed to install log subscriber: {e}")))
}

/// `RUST_LOG` when set, otherwise `level`
fn build_filter(level: &str) -> AppResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AppError::config(format!("Invalid log level {level:?}: {e}"))),
    }
}
