// ABOUTME: Provider platform route handlers
// ABOUTME: Admin-only management of the learning platforms programs are hosted on
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
use tracing::info;
use url::Url;

use super::{json_body, parse_id};
use crate::database::{CreateProviderPlatformRequest, UpdateProviderPlatformRequest};
use crate::errors::{AppError, AppResult};
use crate::server::ServerResources;

/// Provider platform routes handler
pub struct ProviderPlatformRoutes;

impl ProviderPlatformRoutes {
    /// Create provider platform routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/provider-platforms",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/provider-platforms/:id",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/provider-platforms
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let platforms = resources.database.list_provider_platforms().await?;
        Ok((StatusCode::OK, Json(platforms)).into_response())
    }

    /// Handle POST /api/provider-platforms
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateProviderPlatformRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let request = json_body(body)?;
        if request.name.trim().is_empty() {
            return Err(AppError::invalid_input("Provider platform name is required"));
        }
        validate_base_url(&request.base_url)?;

        let platform = resources.database.create_provider_platform(&request).await?;
        info!(
            provider_id = platform.id,
            platform_type = %platform.platform_type,
            "Provider platform created"
        );
        Ok((StatusCode::CREATED, Json(platform)).into_response())
    }

    /// Handle GET /api/provider-platforms/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let provider_id = parse_id(&id, "provider platform")?;

        let platform = resources
            .database
            .get_provider_platform(provider_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Provider platform {provider_id}")))?;
        Ok((StatusCode::OK, Json(platform)).into_response())
    }

    /// Handle PATCH /api/provider-platforms/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Result<Json<UpdateProviderPlatformRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let provider_id = parse_id(&id, "provider platform")?;
        let update = json_body(body)?;
        if let Some(base_url) = &update.base_url {
            validate_base_url(base_url)?;
        }

        let platform = resources
            .database
            .update_provider_platform(provider_id, &update)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Provider platform {provider_id}")))?;
        Ok((StatusCode::OK, Json(platform)).into_response())
    }

    /// Handle DELETE /api/provider-platforms/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let provider_id = parse_id(&id, "provider platform")?;

        if !resources.database.delete_provider_platform(provider_id).await? {
            return Err(AppError::not_found(format!("Provider platform {provider_id}")));
        }
        info!(provider_id, "Provider platform deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

/// Base URLs must be absolute http(s) URLs
fn validate_base_url(base_url: &str) -> AppResult<()> {
    let parsed = Url::parse(base_url.trim())
        .map_err(|_| AppError::invalid_input(format!("Invalid base_url: {base_url}")))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(AppError::invalid_input("base_url must use http or https"))
    }
}
