// ABOUTME: Provider platform database operations
// ABOUTME: Access keys are encrypted on write and decrypted on read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ProviderPlatform, ProviderPlatformState, ProviderPlatformType};

const PROVIDER_COLUMNS: &str = "id, name, type, description, icon_url, account_id, access_key, \
                                base_url, state, external_auth_provider_id, created_at, updated_at";

/// Request body for registering a provider platform
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProviderPlatformRequest {
    /// Display name
    pub name: String,
    /// Platform flavour
    #[serde(rename = "type")]
    pub platform_type: ProviderPlatformType,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Icon shown in the UI
    #[serde(default)]
    pub icon_url: String,
    /// Account id on the platform
    #[serde(default)]
    pub account_id: String,
    /// Plaintext API access key
    pub access_key: String,
    /// Platform base URL
    pub base_url: String,
    /// Initial state
    #[serde(default)]
    pub state: ProviderPlatformState,
}

/// Partial update of a provider platform
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProviderPlatformRequest {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New icon
    pub icon_url: Option<String>,
    /// New account id
    pub account_id: Option<String>,
    /// New plaintext access key
    pub access_key: Option<String>,
    /// New base URL
    pub base_url: Option<String>,
    /// New state
    pub state: Option<ProviderPlatformState>,
}

impl Database {
    /// Insert a provider platform
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the insert fails
    pub async fn create_provider_platform(
        &self,
        request: &CreateProviderPlatformRequest,
    ) -> AppResult<ProviderPlatform> {
        let now = Utc::now();
        let encrypted_key = self.encrypt_data(&request.access_key)?;

        let result = sqlx::query(
            r"
            INSERT INTO provider_platforms (
                name, type, description, icon_url, account_id, access_key,
                base_url, state, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ",
        )
        .bind(&request.name)
        .bind(request.platform_type.as_str())
        .bind(&request.description)
        .bind(&request.icon_url)
        .bind(&request.account_id)
        .bind(&encrypted_key)
        .bind(&request.base_url)
        .bind(request.state.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create provider platform: {e}")))?;

        self.get_provider_platform(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("Provider platform vanished after insert"))
    }

    /// Get a provider platform by ID with its access key decrypted
    ///
    /// # Errors
    ///
    /// Returns an error if the query or decryption fails
    pub async fn get_provider_platform(&self, id: i64) -> AppResult<Option<ProviderPlatform>> {
        let query = format!("SELECT {PROVIDER_COLUMNS} FROM provider_platforms WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get provider platform: {e}")))?;

        row.as_ref().map(|r| self.row_to_provider(r)).transpose()
    }

    /// List all provider platforms ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query or decryption fails
    pub async fn list_provider_platforms(&self) -> AppResult<Vec<ProviderPlatform>> {
        let query = format!("SELECT {PROVIDER_COLUMNS} FROM provider_platforms ORDER BY id ASC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list provider platforms: {e}")))?;

        rows.iter().map(|r| self.row_to_provider(r)).collect()
    }

    /// Apply a partial update, re-encrypting the access key when supplied
    ///
    /// Returns `None` when the platform does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the update fails
    pub async fn update_provider_platform(
        &self,
        id: i64,
        update: &UpdateProviderPlatformRequest,
    ) -> AppResult<Option<ProviderPlatform>> {
        let encrypted_key = update
            .access_key
            .as_deref()
            .map(|key| self.encrypt_data(key))
            .transpose()?;

        let result = sqlx::query(
            r"
            UPDATE provider_platforms SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                icon_url = COALESCE($4, icon_url),
                account_id = COALESCE($5, account_id),
                access_key = COALESCE($6, access_key),
                base_url = COALESCE($7, base_url),
                state = COALESCE($8, state),
                updated_at = $9
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.icon_url.as_deref())
        .bind(update.account_id.as_deref())
        .bind(encrypted_key.as_deref())
        .bind(update.base_url.as_deref())
        .bind(update.state.map(ProviderPlatformState::as_str))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update provider platform: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_provider_platform(id).await
    }

    /// Record the authentication provider id assigned by the platform
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn set_external_auth_provider_id(
        &self,
        id: i64,
        external_auth_provider_id: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE provider_platforms
            SET external_auth_provider_id = $2, updated_at = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(external_auth_provider_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to store external auth provider id: {e}"))
        })?;

        Ok(())
    }

    /// Delete a provider platform and its programs, activity and OIDC client
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_provider_platform(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM provider_platforms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete provider platform: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_provider(&self, row: &SqliteRow) -> AppResult<ProviderPlatform> {
        let type_str: String = row.get("type");
        let platform_type = type_str
            .parse::<ProviderPlatformType>()
            .map_err(|e| AppError::database(format!("Corrupt provider platform row: {e}")))?;
        let state_str: String = row.get("state");
        let state = state_str
            .parse::<ProviderPlatformState>()
            .map_err(|e| AppError::database(format!("Corrupt provider platform row: {e}")))?;
        let encrypted_key: String = row.get("access_key");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(ProviderPlatform {
            id: row.get("id"),
            name: row.get("name"),
            platform_type,
            description: row.get("description"),
            icon_url: row.get("icon_url"),
            account_id: row.get("account_id"),
            access_key: self.decrypt_data(&encrypted_key)?,
            base_url: row.get("base_url"),
            state,
            external_auth_provider_id: row.get("external_auth_provider_id"),
            created_at,
            updated_at,
        })
    }
}
