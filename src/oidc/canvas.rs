// ABOUTME: Canvas authentication_providers API client
// ABOUTME: Registers a Hydra client as an OpenID Connect login provider on a Canvas account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{AppError, AppResult};
use crate::models::ProviderPlatform;

const SERVICE: &str = "Canvas API";

/// OIDC endpoints Canvas should call on the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProviderEndpoints {
    /// Authorization endpoint
    pub authorize_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Userinfo endpoint
    pub userinfo_endpoint: String,
}

impl IdentityProviderEndpoints {
    /// Hydra's public endpoints under `public_base`
    #[must_use]
    pub fn hydra(public_base: &str) -> Self {
        let base = public_base.trim_end_matches('/');
        Self {
            authorize_url: format!("{base}/oauth2/auth"),
            token_url: format!("{base}/oauth2/token"),
            userinfo_endpoint: format!("{base}/userinfo"),
        }
    }
}

/// Client for Canvas account administration endpoints
#[derive(Clone)]
pub struct CanvasClient {
    http: Client,
}

impl CanvasClient {
    /// Create a client sharing `http`
    #[must_use]
    pub const fn new(http: Client) -> Self {
        Self { http }
    }

    /// Create an `openid_connect` authentication provider on the platform's
    /// account and return the id Canvas assigned to it
    ///
    /// # Errors
    ///
    /// Returns an external service error on transport failure, a non-success
    /// status, or a response without a usable `id`
    pub async fn register_authentication_provider(
        &self,
        provider: &ProviderPlatform,
        client_id: &str,
        client_secret: &str,
        endpoints: &IdentityProviderEndpoints,
    ) -> AppResult<String> {
        let url = format!(
            "{}/api/v1/accounts/{}/authentication_providers",
            provider.trimmed_base_url(),
            provider.account_id
        );
        debug!(%url, provider_id = provider.id, "Registering authentication provider");

        let form = [
            ("auth_type", "openid_connect"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("authorize_url", endpoints.authorize_url.as_str()),
            ("token_url", endpoints.token_url.as_str()),
            ("userinfo_endpoint", endpoints.userinfo_endpoint.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&provider.access_key)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!("error creating authentication provider: {status}"),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("JSON parse error: {e}"))
        })?;
        let id = authentication_provider_id(&body).ok_or_else(|| {
            AppError::external_service(SERVICE, "no id in authentication provider response")
        })?;

        info!(provider_id = provider.id, external_id = %id, "Authentication provider registered");
        Ok(id)
    }
}

/// Canvas returns the id as a number; some deployments send a string
#[must_use]
pub fn authentication_provider_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
