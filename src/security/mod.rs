// ABOUTME: HTTP credential transport helpers
// ABOUTME: Bearer header parsing and the session cookie live here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Secure HTTP cookie utilities
pub mod cookies;

use axum::http::{header, HeaderMap};

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// Returns `None` when the header is absent, not UTF-8, uses another scheme
/// or carries an empty token.
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
