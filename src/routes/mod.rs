// ABOUTME: Route module organization for the HTTP API
// ABOUTME: One route group per resource plus shared path, body and listing helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! HTTP routes
//!
//! Each group exposes `routes(resources) -> Router` and is merged by
//! [`crate::server::build_router`]. Handlers authenticate from headers,
//! validate input, and delegate to [`crate::database::Database`].

/// User activity routes
pub mod activity;
/// Login, logout and password reset
pub mod auth;
/// Liveness and database health
pub mod health;
/// OIDC client registration routes
pub mod oidc;
/// Program routes
pub mod programs;
/// Provider platform routes
pub mod provider_platforms;
/// User account routes
pub mod users;

pub use activity::ActivityRoutes;
pub use auth::AuthRoutes;
pub use health::HealthRoutes;
pub use oidc::OidcRoutes;
pub use programs::ProgramRoutes;
pub use provider_platforms::ProviderPlatformRoutes;
pub use users::UserRoutes;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::pagination::PaginationMeta;

/// Paginated listing body
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// Page of records
    pub data: Vec<T>,
    /// Page bookkeeping
    pub meta: PaginationMeta,
}

/// Parse a numeric path segment, failing with `Invalid <label> ID`
pub(crate) fn parse_id(raw: &str, label: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::invalid_input(format!("Invalid {label} ID")))
}

/// Unwrap a JSON body, mapping any rejection to `Invalid request body`
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {rejection}");
        AppError::invalid_input("Invalid request body")
    })
}
