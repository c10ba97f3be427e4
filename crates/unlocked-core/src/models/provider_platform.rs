// ABOUTME: Provider platform model for external learning systems (Canvas, Kolibri)
// ABOUTME: Derives the OIDC redirect URI each platform type expects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelParseError;

/// Supported learning platform flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPlatformType {
    /// Instructure-hosted Canvas
    CanvasCloud,
    /// Self-hosted open source Canvas
    CanvasOss,
    /// Kolibri
    Kolibri,
}

impl ProviderPlatformType {
    /// Database/string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CanvasCloud => "canvas_cloud",
            Self::CanvasOss => "canvas_oss",
            Self::Kolibri => "kolibri",
        }
    }

    /// Whether this is either Canvas flavour
    #[must_use]
    pub const fn is_canvas(self) -> bool {
        matches!(self, Self::CanvasCloud | Self::CanvasOss)
    }
}

impl fmt::Display for ProviderPlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderPlatformType {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canvas_cloud" => Ok(Self::CanvasCloud),
            "canvas_oss" => Ok(Self::CanvasOss),
            "kolibri" => Ok(Self::Kolibri),
            _ => Err(ModelParseError::new("provider platform type", s)),
        }
    }
}

/// Lifecycle state of a provider platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPlatformState {
    /// Active and synced
    #[default]
    Enabled,
    /// Temporarily not synced
    Disabled,
    /// Retired
    Archived,
}

impl ProviderPlatformState {
    /// Database/string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProviderPlatformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderPlatformState {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "archived" => Ok(Self::Archived),
            _ => Err(ModelParseError::new("provider platform state", s)),
        }
    }
}

/// An external learning platform the server integrates with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPlatform {
    /// Primary key
    pub id: i64,
    /// Display name, also used as the OIDC client name
    pub name: String,
    /// Platform flavour
    #[serde(rename = "type")]
    pub platform_type: ProviderPlatformType,
    /// Free-form description
    pub description: String,
    /// Icon shown in the UI
    pub icon_url: String,
    /// Account id on the platform (Canvas root account)
    pub account_id: String,
    /// Plaintext API access key (encrypted at rest, never serialized)
    #[serde(skip_serializing, default)]
    pub access_key: String,
    /// Platform base URL
    pub base_url: String,
    /// Lifecycle state
    pub state: ProviderPlatformState,
    /// Authentication provider id assigned by the platform after OIDC registration
    pub external_auth_provider_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl ProviderPlatform {
    /// Base URL without trailing slashes
    #[must_use]
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Redirect URI the platform uses as an OIDC relying party
    #[must_use]
    pub fn default_redirect_uri(&self) -> String {
        match self.platform_type {
            ProviderPlatformType::CanvasCloud | ProviderPlatformType::CanvasOss => {
                format!("{}/login/oauth2/callback", self.trimmed_base_url())
            }
            ProviderPlatformType::Kolibri => {
                format!("{}/oidccallback/", self.trimmed_base_url())
            }
        }
    }

    /// Whether the platform is a Canvas instance
    #[must_use]
    pub const fn is_canvas(&self) -> bool {
        self.platform_type.is_canvas()
    }
}
