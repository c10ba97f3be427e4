// ABOUTME: OIDC client auto-registration for provider platforms
// ABOUTME: Creates the client in Hydra, then optionally registers it as a Canvas login provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! OIDC client registration
//!
//! Registration is two unary HTTP calls. The Hydra call must succeed. The
//! Canvas call only runs when auto-registration is requested for a Canvas
//! platform, and its failure is logged without failing the registration.

/// Canvas authentication provider API
pub mod canvas;
/// Hydra admin API
pub mod hydra;

use reqwest::Client;
use tracing::{error, info};

use crate::config::OidcConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{NewOidcClient, ProviderPlatform, DEFAULT_SCOPES};
use canvas::{CanvasClient, IdentityProviderEndpoints};
use hydra::HydraAdminClient;

/// Outcome of a registration, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcRegistration {
    /// Client to store
    pub client: NewOidcClient,
    /// Id of the authentication provider created on the platform, if any
    pub external_auth_provider_id: Option<String>,
}

/// Runs the registration flow against the configured identity provider
#[derive(Clone)]
pub struct OidcRegistrar {
    hydra: HydraAdminClient,
    canvas: CanvasClient,
    endpoints: IdentityProviderEndpoints,
}

impl OidcRegistrar {
    /// Build from configuration with a shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns a config error if the HTTP client cannot be built
    pub fn new(config: &OidcConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            hydra: HydraAdminClient::new(http.clone(), config.clone()),
            canvas: CanvasClient::new(http),
            endpoints: IdentityProviderEndpoints::hydra(config.hydra_public_base()),
        })
    }

    /// Register `provider` as an OIDC relying party
    ///
    /// # Errors
    ///
    /// Returns an error only when the Hydra step fails
    pub async fn register_client(
        &self,
        provider: &ProviderPlatform,
        auto_register: bool,
    ) -> AppResult<OidcRegistration> {
        let redirect_uri = provider.default_redirect_uri();
        let created = self
            .hydra
            .create_client(&provider.name, &redirect_uri)
            .await?;

        let scopes = if created.scope.trim().is_empty() {
            DEFAULT_SCOPES.to_owned()
        } else {
            created.scope
        };
        let client = NewOidcClient {
            provider_platform_id: provider.id,
            client_id: created.client_id,
            client_name: created.client_name,
            client_secret: created.client_secret,
            redirect_uris: redirect_uri,
            scopes,
        };

        let external_auth_provider_id = if !auto_register {
            None
        } else if provider.is_canvas() {
            match self
                .canvas
                .register_authentication_provider(
                    provider,
                    &client.client_id,
                    &client.client_secret,
                    &self.endpoints,
                )
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    error!(provider_id = provider.id, "Auto-registration failed: {e}");
                    None
                }
            }
        } else {
            info!(
                provider_id = provider.id,
                platform_type = %provider.platform_type,
                "Auto-registration is only supported for Canvas platforms"
            );
            None
        };

        Ok(OidcRegistration {
            client,
            external_auth_provider_id,
        })
    }
}
