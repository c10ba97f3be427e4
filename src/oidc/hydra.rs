// ABOUTME: Ory Hydra admin API client for OAuth2 client creation
// ABOUTME: Builds the client registration payload and validates Hydra's answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::OidcConfig;
use crate::errors::{AppError, AppResult};
use crate::models::DEFAULT_SCOPES;

const SERVICE: &str = "Hydra admin API";

/// Lifespan applied to every authorization-code grant token
pub const GRANT_TOKEN_LIFESPAN: &str = "3h";

/// Client metadata stored by Hydra
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientMetadata {
    /// Application origin
    #[serde(rename = "Origin")]
    pub origin: String,
}

/// Body of `POST /admin/clients`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateClientRequest {
    /// Human readable name
    pub client_name: String,
    /// Allowed redirect URIs
    pub redirect_uris: Vec<String>,
    /// Space separated scopes
    pub scope: String,
    /// `opaque` or `jwt`
    pub access_token_strategy: String,
    /// Free-form metadata
    pub metadata: ClientMetadata,
    /// CORS origins allowed to call Hydra for this client
    pub allowed_cors_origins: Vec<String>,
    /// Grant types
    pub grant_types: Vec<String>,
    /// Access token lifespan
    pub authorization_code_grant_access_token_lifespan: String,
    /// ID token lifespan
    pub authorization_code_grant_id_token_lifespan: String,
    /// Refresh token lifespan
    pub authorization_code_grant_refresh_token_lifespan: String,
    /// Show the consent screen
    pub skip_consent: bool,
    /// Skip the logout consent screen
    pub skip_logout_consent: bool,
    /// Token endpoint authentication
    pub token_endpoint_auth_method: String,
}

impl CreateClientRequest {
    /// Registration payload for a relying party named `client_name`
    #[must_use]
    pub fn new(config: &OidcConfig, client_name: &str, redirect_uri: &str) -> Self {
        Self {
            client_name: client_name.to_owned(),
            redirect_uris: vec![redirect_uri.to_owned()],
            scope: DEFAULT_SCOPES.to_owned(),
            access_token_strategy: "opaque".to_owned(),
            metadata: ClientMetadata {
                origin: config.app_url.clone(),
            },
            allowed_cors_origins: vec![
                config.hydra_admin_url.clone(),
                config.app_url.clone(),
                config.frontend_url.clone(),
                config.hydra_public_url.clone(),
            ],
            grant_types: vec!["authorization_code".to_owned()],
            authorization_code_grant_access_token_lifespan: GRANT_TOKEN_LIFESPAN.to_owned(),
            authorization_code_grant_id_token_lifespan: GRANT_TOKEN_LIFESPAN.to_owned(),
            authorization_code_grant_refresh_token_lifespan: GRANT_TOKEN_LIFESPAN.to_owned(),
            skip_consent: false,
            skip_logout_consent: true,
            token_endpoint_auth_method: "client_secret_basic".to_owned(),
        }
    }
}

/// Fields read back from Hydra's client response
#[derive(Debug, Clone, Deserialize)]
pub struct HydraClient {
    /// Assigned client id
    pub client_id: String,
    /// Stored client name
    pub client_name: String,
    /// Generated client secret
    pub client_secret: String,
    /// Stored redirect URIs
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Granted scopes
    pub scope: String,
}

/// Client for Hydra's admin endpoints
#[derive(Clone)]
pub struct HydraAdminClient {
    http: Client,
    config: OidcConfig,
}

impl HydraAdminClient {
    /// Create a client sharing `http`
    #[must_use]
    pub const fn new(http: Client, config: OidcConfig) -> Self {
        Self { http, config }
    }

    /// Create an OAuth2 client whose only redirect URI is `redirect_uri`
    ///
    /// # Errors
    ///
    /// Returns a config error when the admin URL is unset, or an external
    /// service error on transport failure, a status other than 200/201, an
    /// unparseable body, or a redirect URI that does not match the request
    pub async fn create_client(
        &self,
        client_name: &str,
        redirect_uri: &str,
    ) -> AppResult<HydraClient> {
        let admin_base = self.config.hydra_admin_base();
        if admin_base.is_empty() {
            return Err(AppError::config("HYDRA_ADMIN_URL is not configured"));
        }

        let request = CreateClientRequest::new(&self.config, client_name, redirect_uri);
        let url = format!("{admin_base}/admin/clients");
        debug!(%url, client_name, "Creating OAuth2 client");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.hydra_admin_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(AppError::external_service(
                SERVICE,
                format!("error creating client: {status}"),
            ));
        }

        let client: HydraClient = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("JSON parse error: {e}"))
        })?;
        verify_redirect_uri(&client, redirect_uri)?;

        info!(client_id = %client.client_id, "OAuth2 client created");
        Ok(client)
    }
}

/// Hydra must echo back the requested redirect URI as the first entry
///
/// # Errors
///
/// Returns an external service error when the list is empty or differs
pub fn verify_redirect_uri(client: &HydraClient, redirect_uri: &str) -> AppResult<()> {
    match client.redirect_uris.first() {
        None => Err(AppError::external_service(
            SERVICE,
            "error creating client: no redirect URIs",
        )),
        Some(received) if received != redirect_uri => Err(AppError::external_service(
            SERVICE,
            "error creating client: redirect URI mismatch",
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    fn config() -> OidcConfig {
        OidcConfig {
            hydra_admin_url: "http://hydra:4445".to_owned(),
            hydra_admin_token: "admintoken".to_owned(),
            hydra_public_url: "http://hydra:4444".to_owned(),
            app_url: "http://app".to_owned(),
            frontend_url: "http://frontend".to_owned(),
            ..OidcConfig::default()
        }
    }

    #[test]
    fn payload_matches_hydra_field_names() {
        let request = CreateClientRequest::new(
            &config(),
            "Canvas",
            "https://canvas.test/login/oauth2/callback",
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["client_name"], "Canvas");
        assert_eq!(
            value["redirect_uris"],
            json!(["https://canvas.test/login/oauth2/callback"])
        );
        assert_eq!(value["scope"], "openid profile email");
        assert_eq!(value["access_token_strategy"], "opaque");
        assert_eq!(value["metadata"], json!({"Origin": "http://app"}));
        assert_eq!(
            value["allowed_cors_origins"],
            json!(["http://hydra:4445", "http://app", "http://frontend", "http://hydra:4444"])
        );
        assert_eq!(value["grant_types"], json!(["authorization_code"]));
        assert_eq!(value["authorization_code_grant_refresh_token_lifespan"], "3h");
        assert_eq!(value["skip_consent"], false);
        assert_eq!(value["skip_logout_consent"], true);
        assert_eq!(value["token_endpoint_auth_method"], "client_secret_basic");
    }

    #[test]
    fn redirect_uri_must_round_trip() {
        let mut client = HydraClient {
            client_id: "id".to_owned(),
            client_name: "name".to_owned(),
            client_secret: "secret".to_owned(),
            redirect_uris: vec![],
            scope: DEFAULT_SCOPES.to_owned(),
        };
        let err = verify_redirect_uri(&client, "https://a/cb").unwrap_err();
        assert!(err.message.ends_with("no redirect URIs"));

        client.redirect_uris = vec!["https://b/cb".to_owned()];
        let err = verify_redirect_uri(&client, "https://a/cb").unwrap_err();
        assert!(err.message.ends_with("redirect URI mismatch"));

        client.redirect_uris = vec!["https://a/cb".to_owned()];
        assert!(verify_redirect_uri(&client, "https://a/cb").is_ok());
    }

    #[tokio::test]
    async fn missing_admin_url_is_a_config_error() {
        let hydra = HydraAdminClient::new(Client::new(), OidcConfig::default());
        let err = hydra.create_client("x", "https://a/cb").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
