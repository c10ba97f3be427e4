// ABOUTME: OIDC client registration route handlers
// ABOUTME: Registers provider platforms with the identity provider and lists stored clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{json_body, parse_id};
use crate::errors::{AppError, AppResult};
use crate::models::OidcClient;
use crate::server::ServerResources;

/// Body of POST /api/oidc/clients
#[derive(Debug, Deserialize)]
pub struct RegisterClientRequest {
    /// Platform to register as a relying party
    pub provider_platform_id: i64,
    /// Also create the login provider on the platform itself
    #[serde(default)]
    pub auto_register: bool,
}

/// Response of POST /api/oidc/clients
#[derive(Debug, Serialize)]
pub struct RegisterClientResponse {
    /// Stored client
    pub client: OidcClient,
    /// Authentication provider id assigned by the platform
    pub external_auth_provider_id: Option<String>,
}

/// OIDC routes handler
pub struct OidcRoutes;

impl OidcRoutes {
    /// Create OIDC routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/oidc/clients",
                get(Self::handle_list).post(Self::handle_register),
            )
            .route("/api/oidc/clients/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle POST /api/oidc/clients
    #[tracing::instrument(skip_all, fields(route = "oidc_register"))]
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<RegisterClientRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let request = json_body(body)?;
        let provider_id = request.provider_platform_id;

        let provider = resources
            .database
            .get_provider_platform(provider_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Provider platform {provider_id}")))?;

        if resources
            .database
            .get_oidc_client_by_provider(provider_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "Provider platform {provider_id} already has an OIDC client"
            )));
        }

        let registration = resources
            .oidc
            .register_client(&provider, request.auto_register)
            .await?;
        let client = resources
            .database
            .create_oidc_client(&registration.client)
            .await?;

        if let Some(external_id) = &registration.external_auth_provider_id {
            resources
                .database
                .set_external_auth_provider_id(provider_id, external_id)
                .await?;
        }

        info!(
            provider_id,
            client_id = %client.client_id,
            auto_registered = registration.external_auth_provider_id.is_some(),
            "OIDC client registered"
        );
        let response = RegisterClientResponse {
            client,
            external_auth_provider_id: registration.external_auth_provider_id,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/oidc/clients
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let clients = resources.database.list_oidc_clients().await?;
        Ok((StatusCode::OK, Json(clients)).into_response())
    }

    /// Handle GET /api/oidc/clients/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let client_id = parse_id(&id, "client")?;

        let client = resources
            .database
            .get_oidc_client(client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("OIDC client {client_id}")))?;
        Ok((StatusCode::OK, Json(client)).into_response())
    }
}
