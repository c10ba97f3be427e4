// ABOUTME: User management database operations
// ABOUTME: Handles account creation, lookup, search, updates and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{is_unique_violation, like_pattern, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};
use crate::pagination::PaginationParams;

const USER_COLUMNS: &str = "id, username, name_first, name_last, email, password_hash, role, \
                            password_reset, created_at, updated_at";

/// Fields required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Given name
    pub name_first: String,
    /// Family name
    pub name_last: String,
    /// Contact email
    pub email: String,
    /// Bcrypt hash of the initial password
    pub password_hash: String,
    /// Account role
    pub role: UserRole,
    /// Force a password change at next login
    pub password_reset: bool,
}

/// Partial update of a user's profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    /// New given name
    pub name_first: Option<String>,
    /// New family name
    pub name_last: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New role
    pub role: Option<UserRole>,
}

impl Database {
    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the username is taken, or a database
    /// error if the insert fails
    pub async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r"
            INSERT INTO users (
                username, name_first, name_last, email, password_hash,
                role, password_reset, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&user.username)
        .bind(&user.name_first)
        .bind(&user.name_last)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.password_reset)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("Username {} is already taken", user.username))
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        self.get_user(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("User vanished after insert"))
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user by id: {e}")))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by username (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 COLLATE NOCASE");
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user by username: {e}")))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Count all users
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))
    }

    /// List users ordered by id, optionally filtered by a search term matched
    /// against username, names and email
    ///
    /// Returns the total number of matching users and the requested page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_users(
        &self,
        search: Option<&str>,
        pagination: &PaginationParams,
    ) -> AppResult<(i64, Vec<User>)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let filter = r"
            WHERE $1 IS NULL
               OR username LIKE $1 ESCAPE '\'
               OR name_first LIKE $1 ESCAPE '\'
               OR name_last LIKE $1 ESCAPE '\'
               OR email LIKE $1 ESCAPE '\'
        ";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {filter}"))
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))?;

        let query = format!(
            "SELECT {USER_COLUMNS} FROM users {filter} ORDER BY id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query)
            .bind(pattern.as_deref())
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list users: {e}")))?;

        let users = rows
            .iter()
            .map(Self::row_to_user)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((total, users))
    }

    /// Apply a partial profile update
    ///
    /// Returns `None` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn update_user(
        &self,
        user_id: i64,
        update: &UpdateUserRequest,
    ) -> AppResult<Option<User>> {
        let result = sqlx::query(
            r"
            UPDATE users SET
                name_first = COALESCE($2, name_first),
                name_last = COALESCE($3, name_last),
                email = COALESCE($4, email),
                role = COALESCE($5, role),
                updated_at = $6
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(update.name_first.as_deref())
        .bind(update.name_last.as_deref())
        .bind(update.email.as_deref())
        .bind(update.role.map(UserRole::as_str))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update user: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(user_id).await
    }

    /// Replace a user's password hash and set the reset flag
    ///
    /// # Errors
    ///
    /// Returns not found if the user does not exist, or a database error
    pub async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: &str,
        password_reset: bool,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users SET password_hash = $2, password_reset = $3, updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(password_reset)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update password: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        Ok(())
    }

    /// Delete a user and, through cascading keys, their activity
    ///
    /// Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails
    pub async fn delete_user(&self, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let role_str: String = row.get("role");
        let role = role_str
            .parse::<UserRole>()
            .map_err(|e| AppError::database(format!("Corrupt user row: {e}")))?;
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            name_first: row.get("name_first"),
            name_last: row.get("name_last"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role,
            password_reset: row.get("password_reset"),
            created_at,
            updated_at,
        })
    }
}
