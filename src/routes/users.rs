// ABOUTME: User account route handlers
// ABOUTME: Admin-managed accounts with generated temporary passwords
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
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{json_body, parse_id, PaginatedResponse};
use crate::auth::generate_temp_password;
use crate::database::{NewUser, UpdateUserRequest};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};
use crate::pagination::PaginationParams;
use crate::server::ServerResources;

/// Body of POST /api/users
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Login name
    pub username: String,
    /// Given name
    #[serde(default)]
    pub name_first: String,
    /// Family name
    #[serde(default)]
    pub name_last: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Account role, student when omitted
    #[serde(default)]
    pub role: UserRole,
}

/// Response of POST /api/users
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    /// Stored account
    pub user: User,
    /// One-time password to hand to the user
    pub temp_password: String,
}

/// User routes handler
pub struct UserRoutes;

impl UserRoutes {
    /// Create user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/users/:id",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/users
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;

        let pagination = PaginationParams::from_query(&query);
        let search = query.get("search").map(String::as_str);
        let (total, users) = resources.database.list_users(search, &pagination).await?;

        let response = PaginatedResponse {
            data: users,
            meta: pagination.meta(total),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/users
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateUserRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        let caller = resources.authenticate_admin(&headers)?;
        let request = json_body(body)?;

        let username = request.username.trim();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(AppError::invalid_input(
                "Username must be non-empty and contain no whitespace",
            ));
        }

        let temp_password = generate_temp_password();
        let password_hash = resources.auth.hash_password(&temp_password).await?;
        let user = resources
            .database
            .create_user(&NewUser {
                username: username.to_owned(),
                name_first: request.name_first,
                name_last: request.name_last,
                email: request.email,
                password_hash,
                role: request.role,
                password_reset: true,
            })
            .await?;

        info!(user_id = user.id, created_by = caller.user_id, "User created");
        let response = CreateUserResponse {
            user,
            temp_password,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/users/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        let caller = resources.authenticate(&headers)?;
        let user_id = parse_id(&id, "user")?;
        caller.require_self_or_admin(user_id)?;

        let user = resources
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }

    /// Handle PATCH /api/users/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Result<Json<UpdateUserRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let user_id = parse_id(&id, "user")?;
        let update = json_body(body)?;

        let user = resources
            .database
            .update_user(user_id, &update)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }

    /// Handle DELETE /api/users/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Response> {
        let caller = resources.authenticate_admin(&headers)?;
        let user_id = parse_id(&id, "user")?;

        if !resources.database.delete_user(user_id).await? {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        info!(user_id, deleted_by = caller.user_id, "User deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
