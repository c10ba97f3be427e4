// ABOUTME: Unified error type with standard error codes and HTTP response mapping
// ABOUTME: Every handler returns AppResult so failures render as consistent JSON errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Error handling
//!
//! [`AppError`] pairs an [`ErrorCode`] with a human readable message. The
//! code decides the HTTP status; the message is what clients see in the
//! `error` field of the response body.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Standard error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No credentials supplied
    AuthRequired,
    /// Credentials supplied but invalid
    AuthInvalid,
    /// Session token has expired
    AuthExpired,
    /// Authenticated but not allowed
    PermissionDenied,
    /// Malformed or semantically invalid input
    InvalidInput,
    /// Requested record does not exist
    ResourceNotFound,
    /// Record conflicts with existing state
    Conflict,
    /// Upstream HTTP service failed
    ExternalServiceError,
    /// Database failure
    DatabaseError,
    /// Missing or invalid configuration
    ConfigError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::ExternalServiceError => StatusCode::BAD_GATEWAY,
            Self::DatabaseError | Self::ConfigError | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable string form used in response bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::AuthInvalid => "auth_invalid",
            Self::AuthExpired => "auth_expired",
            Self::PermissionDenied => "permission_denied",
            Self::InvalidInput => "invalid_input",
            Self::ResourceNotFound => "resource_not_found",
            Self::Conflict => "conflict",
            Self::ExternalServiceError => "external_service_error",
            Self::DatabaseError => "database_error",
            Self::ConfigError => "config_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// Error classification
    pub code: ErrorCode,
    /// Client-facing message
    pub message: String,
}

/// Result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Database failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Unexpected internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Bad client input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing record
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// No credentials
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Bad credentials
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Authenticated user lacks permission
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Conflicting record
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Upstream service failure
    pub fn external_service(service: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ExternalServiceError, format!("{service}: {message}"))
    }

    /// Configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// HTTP status for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            error!(code = %self.code, "{}", self.message);
        } else {
            warn!(code = %self.code, "{}", self.message);
        }

        let body = json!({
            "error": self.message,
            "code": self.code,
        });
        (status, Json(body)).into_response()
    }
}
