// ABOUTME: Learning program model imported from a provider platform
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course or program offered through a provider platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Primary key
    pub id: i64,
    /// Platform hosting the program
    pub provider_platform_id: i64,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Identifier on the provider platform
    pub external_id: Option<String>,
    /// Thumbnail image
    pub thumbnail_url: Option<String>,
    /// Visible to every learner
    pub is_public: bool,
    /// Link to the program on the provider platform
    pub external_url: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}
