// ABOUTME: Session authentication with HS256 JWTs and bcrypt password hashing
// ABOUTME: Resolves the caller from a bearer header or the session cookie and checks roles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{User, UserRole};
use crate::security::cookies::{get_cookie_value, AUTH_COOKIE_NAME};
use crate::security::extract_bearer_token;

/// Length of generated temporary passwords
pub const TEMP_PASSWORD_LEN: usize = 12;

/// Minimum accepted length for a user-chosen password
pub const MIN_PASSWORD_LEN: usize = 8;

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Role at issue time
    pub role: UserRole,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Token id
    pub jti: String,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id
    pub user_id: i64,
    /// Username
    pub username: String,
    /// Role
    pub role: UserRole,
}

impl AuthUser {
    /// Whether the caller is an administrator
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail with 403 unless the caller is an administrator
    ///
    /// # Errors
    ///
    /// Returns permission denied for non-admins
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::permission_denied("Admin access required"))
        }
    }

    /// Fail with 403 unless the caller is `user_id` or an administrator
    ///
    /// # Errors
    ///
    /// Returns permission denied otherwise
    pub fn require_self_or_admin(&self, user_id: i64) -> AppResult<()> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::permission_denied(
                "Not allowed to access another user's data",
            ))
        }
    }
}

/// Issues and validates session tokens and hashes passwords
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthManager {
    /// Build from configuration
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            session_ttl: Duration::hours(config.session_ttl_hours),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Session lifetime in seconds, used for the cookie Max-Age
    #[must_use]
    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl.num_seconds()
    }

    /// Issue a signed session token for `user`
    ///
    /// # Errors
    ///
    /// Returns an internal error if signing fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate signature and expiry and return the claims
    ///
    /// # Errors
    ///
    /// Returns an auth error for expired, malformed or forged tokens
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::new(ErrorCode::AuthExpired, "Session expired")
                }
                _ => {
                    debug!("Rejected token: {e}");
                    AppError::auth_invalid("Invalid session token")
                }
            })
    }

    /// Resolve the caller from `Authorization: Bearer` or the session cookie
    ///
    /// # Errors
    ///
    /// Returns 401 when no token is present or it does not validate
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let token = extract_bearer_token(headers)
            .map(str::to_owned)
            .or_else(|| get_cookie_value(headers, AUTH_COOKIE_NAME).filter(|t| !t.is_empty()))
            .ok_or_else(AppError::auth_required)?;

        let claims = self.validate_token(&token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::auth_invalid("Invalid session token"))?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
            role: claims.role,
        })
    }

    /// Hash a password with bcrypt off the async runtime
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
    }
}

/// Check a password against a bcrypt hash off the async runtime
///
/// A malformed hash verifies as `false`.
///
/// # Errors
///
/// Returns an internal error if the blocking task panics
pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    task::spawn_blocking(move || bcrypt::verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
}

/// Random alphanumeric temporary password
#[must_use]
pub fn generate_temp_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn manager(ttl_hours: i64) -> AuthManager {
        AuthManager::new(&AuthConfig {
            jwt_secret: "test-secret-value".to_owned(),
            session_ttl_hours: ttl_hours,
            bcrypt_cost: 4,
            default_admin_password: "ChangeMe!".to_owned(),
        })
    }

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            username: "jdoe".to_owned(),
            name_first: "Jane".to_owned(),
            name_last: "Doe".to_owned(),
            email: "jane@example.com".to_owned(),
            password_hash: String::new(),
            role,
            password_reset: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_carries_identity() {
        let auth = manager(1);
        let token = auth.generate_token(&user(UserRole::Admin)).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "jdoe");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = manager(-2);
        let token = auth.generate_token(&user(UserRole::Student)).unwrap();
        let err = auth.validate_token(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthExpired);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthManager::new(&AuthConfig {
            jwt_secret: "another-secret".to_owned(),
            session_ttl_hours: 1,
            bcrypt_cost: 4,
            default_admin_password: String::new(),
        });
        let token = other.generate_token(&user(UserRole::Admin)).unwrap();
        assert!(manager(1).validate_token(&token).is_err());
    }

    #[test]
    fn authenticate_reads_cookie_when_no_bearer() {
        let auth = manager(1);
        let token = auth.generate_token(&user(UserRole::Student)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("auth_token={token}")).unwrap(),
        );
        let caller = auth.authenticate(&headers).unwrap();
        assert_eq!(caller.user_id, 7);
        assert!(caller.require_admin().is_err());
        assert!(caller.require_self_or_admin(7).is_ok());
        assert!(caller.require_self_or_admin(8).is_err());
    }

    #[test]
    fn authenticate_without_credentials_fails() {
        let err = manager(1).authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[test]
    fn temp_passwords_are_alphanumeric() {
        let password = generate_temp_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let auth = manager(1);
        let hash = auth.hash_password("s3cret-pass").await.unwrap();
        assert!(verify_password("s3cret-pass", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("x", "not-a-hash").await.unwrap());
    }
}
