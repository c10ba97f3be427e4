// ABOUTME: UnlockEd server binary
// ABOUTME: Loads configuration, prepares the database and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # UnlockEd Server
//!
//! ## Usage
//!
//! ```bash
//! # Serve using an existing schema
//! cargo run --bin unlocked-server
//!
//! # Apply pending migrations, then serve
//! cargo run --bin unlocked-server -- --migrate
//!
//! # Drop every table, migrate from scratch, then serve
//! cargo run --bin unlocked-server -- --migrate-fresh
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use unlocked_server::config::ServerConfig;
use unlocked_server::database::Database;
use unlocked_server::logging::init_logging;
use unlocked_server::server::{ensure_default_admin, run, ServerResources};

#[derive(Parser)]
#[command(
    name = "unlocked-server",
    about = "UnlockEd learning-management API server",
    version
)]
struct Args {
    /// Run pending database migrations before serving
    #[arg(long)]
    migrate: bool,

    /// Drop all tables and re-run every migration before serving
    #[arg(long, conflicts_with = "migrate")]
    migrate_fresh: bool,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!(
        environment = %config.environment,
        dotenv = dotenv_loaded,
        "Starting UnlockEd server"
    );

    ensure_database_dir(&config.database.url)?;
    let database = Database::connect(&config.database.url, config.encryption_key.clone())
        .await
        .context("Failed to connect to database")?;

    if args.migrate_fresh {
        database.migrate_fresh().await.context("Fresh migration failed")?;
    } else if args.migrate || config.environment.is_testing() {
        database.migrate().await.context("Migration failed")?;
    }

    let resources = Arc::new(
        ServerResources::new(database, config).context("Failed to build server resources")?,
    );

    if let Some(admin) = ensure_default_admin(&resources)
        .await
        .context("Failed to bootstrap admin account (run with --migrate on a new database)")?
    {
        info!(user_id = admin.id, "Bootstrap admin ready");
    }

    run(resources).await.context("Server terminated with an error")?;
    Ok(())
}

/// Create the parent directory of a file-backed SQLite database
fn ensure_database_dir(database_url: &str) -> Result<()> {
    if database_url.contains(":memory:") {
        return Ok(());
    }
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        warn!("DATABASE_URL is not a sqlite URL, skipping directory creation");
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}
