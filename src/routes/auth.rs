// ABOUTME: Session route handlers for login, logout and password reset
// ABOUTME: Sessions are JWTs delivered in the httpOnly auth_token cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::json_body;
use crate::auth::{verify_password, MIN_PASSWORD_LEN};
use crate::errors::{AppError, AppResult};
use crate::security::cookies::{clear_auth_cookie, set_auth_cookie};
use crate::server::ServerResources;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Body of POST /api/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Body of POST /api/reset-password
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// New plaintext password
    pub password: String,
}

/// Session routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create session routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/login", post(Self::handle_login))
            .route("/api/logout", post(Self::handle_logout))
            .route("/api/reset-password", post(Self::handle_reset_password))
            .with_state(resources)
    }

    /// Handle POST /api/login
    #[tracing::instrument(skip_all, fields(route = "login"))]
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<LoginRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        let request = json_body(body)?;

        let Some(user) = resources
            .database
            .get_user_by_username(request.username.trim())
            .await?
        else {
            warn!("Login attempt for unknown user");
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        };

        if !verify_password(&request.password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        }

        let token = resources.auth.generate_token(&user)?;
        let mut headers = HeaderMap::new();
        set_auth_cookie(
            &mut headers,
            &token,
            resources.auth.session_ttl_secs(),
            resources.secure_cookies(),
        );

        info!(user_id = user.id, "User logged in");
        Ok((StatusCode::OK, headers, Json(user)).into_response())
    }

    /// Handle POST /api/logout
    async fn handle_logout(State(resources): State<Arc<ServerResources>>) -> Response {
        let mut headers = HeaderMap::new();
        clear_auth_cookie(&mut headers, resources.secure_cookies());
        (
            StatusCode::OK,
            headers,
            Json(json!({ "message": "Logged out" })),
        )
            .into_response()
    }

    /// Handle POST /api/reset-password
    async fn handle_reset_password(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<ResetPasswordRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        let caller = resources.authenticate(&headers)?;
        let request = json_body(body)?;

        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = resources.auth.hash_password(&request.password).await?;
        resources
            .database
            .update_user_password(caller.user_id, &password_hash, false)
            .await?;
        let user = resources
            .database
            .get_user(caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {}", caller.user_id)))?;

        info!(user_id = user.id, "Password reset");
        Ok((StatusCode::OK, Json(user)).into_response())
    }
}
