// ABOUTME: Program database operations
// ABOUTME: CRUD and name search over programs offered by provider platforms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{is_foreign_key_violation, like_pattern, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Program;
use crate::pagination::PaginationParams;

const PROGRAM_COLUMNS: &str = "id, provider_platform_id, name, description, external_id, \
                               thumbnail_url, is_public, external_url, created_at, updated_at";

/// Request body for creating a program
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramRequest {
    /// Hosting platform
    pub provider_platform_id: i64,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Identifier on the provider platform
    pub external_id: Option<String>,
    /// Thumbnail image
    pub thumbnail_url: Option<String>,
    /// Visible to every learner
    #[serde(default)]
    pub is_public: bool,
    /// Link to the program on the provider platform
    pub external_url: Option<String>,
}

/// Partial update of a program
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProgramRequest {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New external id
    pub external_id: Option<String>,
    /// New thumbnail
    pub thumbnail_url: Option<String>,
    /// New visibility
    pub is_public: Option<bool>,
    /// New external link
    pub external_url: Option<String>,
}

impl Database {
    /// Insert a program
    ///
    /// # Errors
    ///
    /// Returns invalid input when the provider platform does not exist, or a
    /// database error if the insert fails
    pub async fn create_program(&self, request: &CreateProgramRequest) -> AppResult<Program> {
        let now = Utc::now();

        let result = sqlx::query(
            r"
            INSERT INTO programs (
                provider_platform_id, name, description, external_id,
                thumbnail_url, is_public, external_url, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(request.provider_platform_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.external_id.as_deref())
        .bind(request.thumbnail_url.as_deref())
        .bind(request.is_public)
        .bind(request.external_url.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::invalid_input(format!(
                    "Provider platform {} does not exist",
                    request.provider_platform_id
                ))
            } else {
                AppError::database(format!("Failed to create program: {e}"))
            }
        })?;

        self.get_program(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("Program vanished after insert"))
    }

    /// Get a program by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_program(&self, id: i64) -> AppResult<Option<Program>> {
        let query = format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get program: {e}")))?;

        Ok(row.as_ref().map(Self::row_to_program))
    }

    /// List programs ordered by id with an optional name search
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_programs(
        &self,
        search: Option<&str>,
        pagination: &PaginationParams,
    ) -> AppResult<(i64, Vec<Program>)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let filter = r"WHERE $1 IS NULL OR name LIKE $1 ESCAPE '\'";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM programs {filter}"))
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count programs: {e}")))?;

        let query = format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs {filter} ORDER BY id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query)
            .bind(pattern.as_deref())
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list programs: {e}")))?;

        Ok((total, rows.iter().map(Self::row_to_program).collect()))
    }

    /// Apply a partial update
    ///
    /// Returns `None` when the program does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_program(
        &self,
        id: i64,
        update: &UpdateProgramRequest,
    ) -> AppResult<Option<Program>> {
        let result = sqlx::query(
            r"
            UPDATE programs SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                external_id = COALESCE($4, external_id),
                thumbnail_url = COALESCE($5, thumbnail_url),
                is_public = COALESCE($6, is_public),
                external_url = COALESCE($7, external_url),
                updated_at = $8
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.external_id.as_deref())
        .bind(update.thumbnail_url.as_deref())
        .bind(update.is_public)
        .bind(update.external_url.as_deref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update program: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_program(id).await
    }

    /// Delete a program and its activity
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_program(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete program: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_program(row: &SqliteRow) -> Program {
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");
        Program {
            id: row.get("id"),
            provider_platform_id: row.get("provider_platform_id"),
            name: row.get("name"),
            description: row.get("description"),
            external_id: row.get("external_id"),
            thumbnail_url: row.get("thumbnail_url"),
            is_public: row.get("is_public"),
            external_url: row.get("external_url"),
            created_at,
            updated_at,
        }
    }
}
