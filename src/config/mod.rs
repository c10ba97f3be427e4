// ABOUTME: Configuration module root
// ABOUTME: Configuration is read from the process environment only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment-driven server configuration
pub mod environment;

pub use environment::{
    AuthConfig, DatabaseConfig, Environment, LogFormat, LoggingConfig, OidcConfig, ServerConfig,
};
