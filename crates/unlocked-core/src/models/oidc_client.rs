// ABOUTME: OIDC client registration records linking a provider platform to the OAuth2 server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scopes requested for every registered client
pub const DEFAULT_SCOPES: &str = "openid profile email";

/// A stored OIDC client registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcClient {
    /// Primary key
    pub id: i64,
    /// Provider platform this client authenticates
    pub provider_platform_id: i64,
    /// Client id issued by the OAuth2 server
    pub client_id: String,
    /// Client name as registered
    pub client_name: String,
    /// Client secret issued by the OAuth2 server
    pub client_secret: String,
    /// Registered redirect URI
    pub redirect_uris: String,
    /// Space separated scopes granted
    pub scopes: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Client data returned by the OAuth2 server, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOidcClient {
    /// Provider platform this client authenticates
    pub provider_platform_id: i64,
    /// Client id issued by the OAuth2 server
    pub client_id: String,
    /// Client name as registered
    pub client_name: String,
    /// Client secret issued by the OAuth2 server
    pub client_secret: String,
    /// Registered redirect URI
    pub redirect_uris: String,
    /// Space separated scopes granted
    pub scopes: String,
}
