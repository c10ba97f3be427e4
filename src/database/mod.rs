// ABOUTME: Core database management with embedded migrations for SQLite
// ABOUTME: Owns the connection pool and AES-256-GCM encryption of secrets at rest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Learner activity storage and daily aggregation
pub mod activities;
/// OIDC client registration storage
pub mod oidc_clients;
/// Program storage
pub mod programs;
/// Provider platform storage
pub mod provider_platforms;
/// User account storage
pub mod users;

pub use activities::{ActivityFilter, ActivityWindow, CreateActivityRequest};
pub use programs::{CreateProgramRequest, UpdateProgramRequest};
pub use provider_platforms::{CreateProviderPlatformRequest, UpdateProviderPlatformRequest};
pub use users::{NewUser, UpdateUserRequest};

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};

/// Length of the AES-GCM nonce prefixed to every ciphertext
const NONCE_LEN: usize = 12;

/// Pool size for file-backed databases
const MAX_CONNECTIONS: u32 = 5;

/// Generate a random 32-byte encryption key
#[must_use]
pub fn generate_encryption_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    let rng = SystemRandom::new();
    if rng.fill(&mut key).is_err() {
        // SystemRandom only fails when the OS RNG is unavailable
        warn!("System RNG unavailable, falling back to rand thread RNG for key generation");
        rand::thread_rng().fill(&mut key);
    }
    key
}

/// Database connection pool with encryption support
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    encryption_key: Vec<u8>,
}

impl Database {
    /// Connect and apply all pending migrations
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database URL is invalid or malformed
    /// - Database connection fails
    /// - Migration process fails
    /// - Encryption key is not 32 bytes
    pub async fn new(database_url: &str, encryption_key: Vec<u8>) -> AppResult<Self> {
        let db = Self::connect(database_url, encryption_key).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Connect without touching the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, the connection fails or the
    /// encryption key is not 32 bytes
    pub async fn connect(database_url: &str, encryption_key: Vec<u8>) -> AppResult<Self> {
        if encryption_key.len() != 32 {
            return Err(AppError::config(format!(
                "Encryption key must be 32 bytes, got {}",
                encryption_key.len()
            )));
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // In-memory databases live only as long as a connection is open
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        Ok(Self {
            pool,
            encryption_key,
        })
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query
    ///
    /// # Errors
    ///
    /// Returns a database error if the pool cannot serve a query
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database health check failed: {e}")))?;
        Ok(())
    }

    /// Run all pending migrations embedded at compile time
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails
    pub async fn migrate(&self) -> AppResult<()> {
        info!("Running database migrations...");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Drop every table (including migration bookkeeping) and migrate from scratch
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be dropped or a migration fails
    pub async fn migrate_fresh(&self) -> AppResult<()> {
        warn!("Dropping all tables for a fresh migration");

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to list tables: {e}")))?;

        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to disable foreign keys: {e}")))?;

        for table in &tables {
            let statement = format!("DROP TABLE IF EXISTS \"{}\"", table.replace('"', "\"\""));
            sqlx::query(&statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| AppError::database(format!("Failed to drop table {table}: {e}")))?;
        }

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to enable foreign keys: {e}")))?;

        drop(conn);
        info!("Dropped {} tables", tables.len());

        self.migrate().await
    }

    /// Encrypt sensitive data using AES-256-GCM
    ///
    /// Output is base64(nonce || ciphertext || tag).
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn encrypt_data(&self, data: &str) -> AppResult<String> {
        let rng = SystemRandom::new();

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill(&mut nonce_bytes)
            .map_err(|e| AppError::internal(format!("Failed to generate nonce: {e}")))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let key = self.aead_key()?;

        let mut data_bytes = data.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut data_bytes)
            .map_err(|e| AppError::internal(format!("Failed to encrypt data: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(data_bytes);

        Ok(STANDARD.encode(combined))
    }

    /// Decrypt data produced by [`Database::encrypt_data`]
    ///
    /// # Errors
    ///
    /// Returns an error if decryption fails or data is malformed
    pub fn decrypt_data(&self, encrypted_data: &str) -> AppResult<String> {
        let combined = STANDARD
            .decode(encrypted_data)
            .map_err(|e| AppError::internal(format!("Failed to decode base64: {e}")))?;

        if combined.len() < NONCE_LEN {
            return Err(AppError::internal("Invalid encrypted data: too short"));
        }

        let (nonce_bytes, encrypted_bytes) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::assume_unique_for_key(
            nonce_bytes
                .try_into()
                .map_err(|e| AppError::internal(format!("Invalid nonce size: {e}")))?,
        );

        let key = self.aead_key()?;

        let mut decrypted_data = encrypted_bytes.to_vec();
        let decrypted = key
            .open_in_place(nonce, Aad::empty(), &mut decrypted_data)
            .map_err(|e| AppError::internal(format!("Failed to decrypt data: {e}")))?;

        String::from_utf8(decrypted.to_vec()).map_err(|e| {
            AppError::internal(format!("Failed to convert decrypted data to string: {e}"))
        })
    }

    fn aead_key(&self) -> AppResult<LessSafeKey> {
        let unbound_key = UnboundKey::new(&AES_256_GCM, &self.encryption_key)
            .map_err(|e| AppError::internal(format!("Failed to create encryption key: {e}")))?;
        Ok(LessSafeKey::new(unbound_key))
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Whether a sqlx error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
