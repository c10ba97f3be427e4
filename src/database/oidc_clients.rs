// ABOUTME: OIDC client registration database operations
// ABOUTME: Client secrets are encrypted at rest like provider access keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{is_foreign_key_violation, is_unique_violation, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{NewOidcClient, OidcClient};

const OIDC_COLUMNS: &str = "id, provider_platform_id, client_id, client_name, client_secret, \
                            redirect_uris, scopes, created_at, updated_at";

impl Database {
    /// Persist a client returned by the OAuth2 server
    ///
    /// # Errors
    ///
    /// Returns a conflict when the provider already has a client, invalid
    /// input when the provider does not exist, or a database error
    pub async fn create_oidc_client(&self, client: &NewOidcClient) -> AppResult<OidcClient> {
        let now = Utc::now();
        let encrypted_secret = self.encrypt_data(&client.client_secret)?;

        let result = sqlx::query(
            r"
            INSERT INTO oidc_clients (
                provider_platform_id, client_id, client_name, client_secret,
                redirect_uris, scopes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ",
        )
        .bind(client.provider_platform_id)
        .bind(&client.client_id)
        .bind(&client.client_name)
        .bind(&encrypted_secret)
        .bind(&client.redirect_uris)
        .bind(&client.scopes)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "Provider platform {} already has an OIDC client",
                    client.provider_platform_id
                ))
            } else if is_foreign_key_violation(&e) {
                AppError::invalid_input(format!(
                    "Provider platform {} does not exist",
                    client.provider_platform_id
                ))
            } else {
                AppError::database(format!("Failed to create OIDC client: {e}"))
            }
        })?;

        self.get_oidc_client(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("OIDC client vanished after insert"))
    }

    /// Get a client by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query or decryption fails
    pub async fn get_oidc_client(&self, id: i64) -> AppResult<Option<OidcClient>> {
        let query = format!("SELECT {OIDC_COLUMNS} FROM oidc_clients WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get OIDC client: {e}")))?;

        row.as_ref().map(|r| self.row_to_oidc_client(r)).transpose()
    }

    /// Get the client registered for a provider platform
    ///
    /// # Errors
    ///
    /// Returns an error if the query or decryption fails
    pub async fn get_oidc_client_by_provider(
        &self,
        provider_platform_id: i64,
    ) -> AppResult<Option<OidcClient>> {
        let query = format!("SELECT {OIDC_COLUMNS} FROM oidc_clients WHERE provider_platform_id = $1");
        let row = sqlx::query(&query)
            .bind(provider_platform_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get OIDC client: {e}")))?;

        row.as_ref().map(|r| self.row_to_oidc_client(r)).transpose()
    }

    /// List every registered client
    ///
    /// # Errors
    ///
    /// Returns an error if the query or decryption fails
    pub async fn list_oidc_clients(&self) -> AppResult<Vec<OidcClient>> {
        let query = format!("SELECT {OIDC_COLUMNS} FROM oidc_clients ORDER BY id ASC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list OIDC clients: {e}")))?;

        rows.iter().map(|r| self.row_to_oidc_client(r)).collect()
    }

    fn row_to_oidc_client(&self, row: &SqliteRow) -> AppResult<OidcClient> {
        let encrypted_secret: String = row.get("client_secret");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(OidcClient {
            id: row.get("id"),
            provider_platform_id: row.get("provider_platform_id"),
            client_id: row.get("client_id"),
            client_name: row.get("client_name"),
            client_secret: self.decrypt_data(&encrypted_secret)?,
            redirect_uris: row.get("redirect_uris"),
            scopes: row.get("scopes"),
            created_at,
            updated_at,
        })
    }
}
