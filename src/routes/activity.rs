// ABOUTME: Learner activity route handlers
// ABOUTME: Per-user and per-program activity listings, daily aggregates and activity recording
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
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use super::{json_body, parse_id};
use crate::database::{ActivityFilter, ActivityWindow, CreateActivityRequest};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{Activity, DailyActivity};
use crate::pagination::PaginationParams;
use crate::server::ServerResources;

/// Default page size for a user's activity: one entry per day of a year
pub const USER_ACTIVITY_PER_PAGE: u32 = 365;

/// Counted activity listing
#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    /// Total matching records
    pub count: i64,
    /// Activities on the requested page
    pub activities: Vec<Activity>,
}

/// Daily aggregate listing
#[derive(Debug, Serialize)]
pub struct DailyActivityResponse {
    /// One entry per active day
    pub activities: Vec<DailyActivity>,
}

/// Activity routes handler
pub struct ActivityRoutes;

impl ActivityRoutes {
    /// Create activity routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/:id/activity",
                get(Self::handle_user_activity).post(Self::handle_create_activity),
            )
            .route(
                "/api/users/:id/daily-activity",
                get(Self::handle_daily_activity),
            )
            .route(
                "/api/programs/:id/activity",
                get(Self::handle_program_activity),
            )
            .with_state(resources)
    }

    /// Handle GET /api/users/:id/activity
    async fn handle_user_activity(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
    ) -> AppResult<Response> {
        let caller = resources.authenticate(&headers)?;
        let user_id = parse_id(&id, "user")?;
        caller.require_self_or_admin(user_id)?;

        let program_id = query
            .get("program")
            .filter(|p| !p.trim().is_empty())
            .map(|p| parse_id(p, "program"))
            .transpose()?;
        let window = parse_year(&query)?.map(ActivityWindow::for_year).transpose()?;
        let filter = ActivityFilter { program_id, window };
        let pagination =
            PaginationParams::from_query_with(&query, USER_ACTIVITY_PER_PAGE, USER_ACTIVITY_PER_PAGE);

        let (count, activities) = resources
            .database
            .get_activity_by_user_id(user_id, &filter, &pagination)
            .await
            .map_err(|e| masked(e, "Failed to get activities"))?;

        Ok((StatusCode::OK, Json(ActivityListResponse { count, activities })).into_response())
    }

    /// Handle GET /api/users/:id/daily-activity
    async fn handle_daily_activity(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
    ) -> AppResult<Response> {
        let caller = resources.authenticate(&headers)?;
        let user_id = parse_id(&id, "user")?;
        caller.require_self_or_admin(user_id)?;

        let window = match parse_year(&query)? {
            Some(year) => ActivityWindow::for_year(year)?,
            None => ActivityWindow::trailing_year(Utc::now()),
        };

        let activities = resources
            .database
            .get_daily_activity_by_user_id(user_id, window)
            .await
            .map_err(|e| masked(e, "Failed to get activities"))?;

        Ok((StatusCode::OK, Json(DailyActivityResponse { activities })).into_response())
    }

    /// Handle GET /api/programs/:id/activity
    async fn handle_program_activity(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let program_id = parse_id(&id, "program")?;
        let pagination = PaginationParams::from_query(&query);

        let (count, activities) = resources
            .database
            .get_activity_by_program_id(program_id, &pagination)
            .await
            .map_err(|e| masked(e, "Failed to get activities"))?;

        Ok((StatusCode::OK, Json(ActivityListResponse { count, activities })).into_response())
    }

    /// Handle POST /api/users/:id/activity
    async fn handle_create_activity(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Result<Json<CreateActivityRequest>, JsonRejection>,
    ) -> AppResult<Response> {
        resources.authenticate_admin(&headers)?;
        let user_id = parse_id(&id, "user")?;
        let request = json_body(body)?;

        let activity = resources
            .database
            .create_activity(user_id, &request)
            .await
            .map_err(|e| masked(e, "Failed to create activity"))?;

        info!(
            user_id,
            program_id = activity.program_id,
            time_delta = activity.time_delta,
            "Activity recorded"
        );
        Ok((StatusCode::OK, Json(activity)).into_response())
    }
}

/// Optional `year` query parameter
fn parse_year(query: &HashMap<String, String>) -> AppResult<Option<i32>> {
    query
        .get("year")
        .map(|y| y.trim())
        .filter(|y| !y.is_empty())
        .map(|y| {
            y.parse::<i32>()
                .map_err(|_| AppError::invalid_input("Invalid year parameter"))
        })
        .transpose()
}

/// Replace database failure details with a stable client message
fn masked(e: AppError, message: &str) -> AppError {
    if e.code == ErrorCode::DatabaseError {
        error!("{message}: {e}");
        AppError::database(message)
    } else {
        e
    }
}
