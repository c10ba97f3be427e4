// ABOUTME: Main library entry point for the UnlockEd learning-management server
// ABOUTME: Exposes the HTTP API, database layer, authentication and OIDC registration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # UnlockEd Server
//!
//! A learning-management backend. It serves JSON CRUD over users, programs,
//! provider platforms and learner activity, and registers provider
//! platforms as OIDC relying parties with Ory Hydra (optionally creating the
//! matching login provider on a Canvas instance).
//!
//! ## Architecture
//!
//! - **Models**: shared DTOs from `unlocked-core`
//! - **Database**: `sqlx` SQLite pool with embedded migrations
//! - **Auth**: HS256 session JWTs and bcrypt password hashes
//! - **OIDC**: Hydra admin and Canvas API clients
//! - **Routes**: one axum route group per resource
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use unlocked_server::config::ServerConfig;
//! use unlocked_server::database::Database;
//! use unlocked_server::errors::AppResult;
//! use unlocked_server::server::{run, ServerResources};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::new(&config.database.url, config.encryption_key.clone()).await?;
//!     let resources = Arc::new(ServerResources::new(database, config)?);
//!     run(resources).await
//! }
//! ```

/// Session tokens, password hashing and caller roles
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Database pool, migrations and per-table operations
pub mod database;

/// Application error type and HTTP mapping
pub mod errors;

/// Tracing subscriber setup
pub mod logging;

/// Shared data models
pub mod models {
    pub use unlocked_core::models::*;
}

/// OIDC client registration with Hydra and Canvas
pub mod oidc;

/// Page-based pagination parameters
pub mod pagination;

/// HTTP route groups
pub mod routes;

/// Cookie and bearer token helpers
pub mod security;

/// Router assembly, shared resources and serving
pub mod server;
