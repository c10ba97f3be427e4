// ABOUTME: Domain model module root with shared parse error and pagination metadata
// ABOUTME: Re-exports every record type used by the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Activity records and daily aggregates
pub mod activity;
/// OIDC client registrations
pub mod oidc_client;
/// Learning programs
pub mod program;
/// External learning platforms (Canvas, Kolibri)
pub mod provider_platform;
/// User accounts and roles
pub mod user;

pub use activity::{Activity, ActivityType, DailyActivity};
pub use oidc_client::{NewOidcClient, OidcClient, DEFAULT_SCOPES};
pub use program::Program;
pub use provider_platform::{ProviderPlatform, ProviderPlatformState, ProviderPlatformType};
pub use user::{User, UserRole};

/// Error returned when a stored or submitted enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct ModelParseError {
    /// Name of the enum being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ModelParseError {
    /// Create a parse error for the given enum kind
    #[must_use]
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Page metadata returned alongside paginated listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of matching records
    pub total: i64,
    /// Current page (1-indexed)
    pub current_page: u32,
    /// Page size
    pub per_page: u32,
    /// Last available page (at least 1)
    pub last_page: u32,
}

impl PaginationMeta {
    /// Build metadata for a page of `per_page` records out of `total`
    #[must_use]
    pub fn new(total: i64, current_page: u32, per_page: u32) -> Self {
        let per_page_i64 = i64::from(per_page.max(1));
        let pages = (total.max(0) + per_page_i64 - 1) / per_page_i64;
        Self {
            total,
            current_page,
            per_page,
            last_page: u32::try_from(pages).unwrap_or(u32::MAX).max(1),
        }
    }
}
