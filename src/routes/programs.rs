// ABOUTME: Program route handlers
// ABOUTME: Listing and lookup for any signed-in user, mutation for admins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use super::{json_body, parse_id, PaginatedResponse};
use crate::database::{CreateProgramRequest, UpdateProgramRequest};
use crate::errors::{AppError, AppResult};
use crate::pagination::PaginationParams;
use crate::server::ServerResources;

/// Program routes handler
pub struct ProgramRoutes;

impl ProgramRoutes {
    /// Create program routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/programs",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/programs/:id",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/programs
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> AppResult<Response> {
        resources.authenticate(&headers)?;

        let pagination = PaginationParams::from_query(&query);
        let search = query.get("search").map(String::as_str);
        let (total, programs) = resources
            .database
            .list_programs(search, &pagination)
            .await?;

        let response = PaginatedResponse {
            data: programs,
            meta: pagination.meta(total),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/programs
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateProgramRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let request = json_body(body)?;
        if request.name.trim().is_empty() {
            return Err(AppError::invalid_input("Program name is required"));
        }

        let program = resources.database.create_program(&request).await?;
        info!(program_id = program.id, "Program created");
        Ok((StatusCode::CREATED, Json(program)).into_response())
    }

    /// Handle GET /api/programs/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        resources.authenticate(&headers)?;
        let program_id = parse_id(&id, "program")?;

        let program = resources
            .database
            .get_program(program_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {program_id}")))?;
        Ok((StatusCode::OK, Json(program)).into_response())
    }

    /// Handle PATCH /api/programs/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Result<Json<UpdateProgramRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let program_id = parse_id(&id, "program")?;
        let update = json_body(body)?;

        let program = resources
            .database
            .update_program(program_id, &update)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {program_id}")))?;
        Ok((StatusCode::OK, Json(program)).into_response())
    }

    /// Handle DELETE /api/programs/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let program_id = parse_id(&id, "program")?;

        if !resources.database.delete_program(program_id).await? {
            return Err(AppError::not_found(format!("Program {program_id}")));
        }
        info!(program_id, "Program deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
