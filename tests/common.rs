// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory resources, user, provider and program fixtures and auth headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `unlocked_server`

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use unlocked_server::config::ServerConfig;
use unlocked_server::database::{
    CreateProgramRequest, CreateProviderPlatformRequest, Database, NewUser,
};
use unlocked_server::models::{
    Program, ProviderPlatform, ProviderPlatformState, ProviderPlatformType, User, UserRole,
};
use unlocked_server::server::{build_router, ServerResources};

/// Password given to every fixture user
pub const TEST_PASSWORD: &str = "correct-horse";

/// Configuration for an in-memory testing server, optionally pointing the
/// identity provider at `idp_url`
pub fn test_config(idp_url: Option<&str>) -> ServerConfig {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("APP_ENV", "testing".to_owned()),
        ("JWT_SECRET", "integration-test-jwt-secret".to_owned()),
        ("BCRYPT_COST", "4".to_owned()),
        ("APP_URL", "http://app.test".to_owned()),
        ("FRONTEND_URL", "http://frontend.test".to_owned()),
        ("HYDRA_ADMIN_TOKEN", "admintoken".to_owned()),
        ("HTTP_TIMEOUT_SECS", "5".to_owned()),
    ]);
    if let Some(url) = idp_url {
        vars.insert("HYDRA_ADMIN_URL", url.to_owned());
        vars.insert("HYDRA_PUBLIC_URL", url.to_owned());
    }
    ServerConfig::from_source(|key| vars.get(key).cloned()).unwrap()
}

/// Fresh in-memory database with the schema applied
pub async fn create_test_database() -> Result<Database> {
    let config = test_config(None);
    Ok(Database::new(&config.database.url, config.encryption_key).await?)
}

/// Resources over a fresh in-memory database
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    create_test_resources_with_idp(None).await
}

/// Resources whose OIDC registrar talks to `idp_url`
pub async fn create_test_resources_with_idp(idp_url: Option<&str>) -> Result<Arc<ServerResources>> {
    let config = test_config(idp_url);
    let database = Database::new(&config.database.url, config.encryption_key.clone()).await?;
    Ok(Arc::new(ServerResources::new(database, config)?))
}

/// Full application router
pub fn router(resources: &Arc<ServerResources>) -> Router {
    build_router(Arc::clone(resources))
}

/// Insert a user whose password is [`TEST_PASSWORD`]
pub async fn create_test_user(
    resources: &ServerResources,
    username: &str,
    role: UserRole,
) -> Result<User> {
    let password_hash = resources.auth.hash_password(TEST_PASSWORD).await?;
    Ok(resources
        .database
        .create_user(&NewUser {
            username: username.to_owned(),
            name_first: "Test".to_owned(),
            name_last: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash,
            role,
            password_reset: false,
        })
        .await?)
}

/// `Authorization` header value for `user`
pub fn bearer(resources: &ServerResources, user: &User) -> String {
    format!("Bearer {}", resources.auth.generate_token(user).unwrap())
}

/// An admin and a student with their bearer headers
pub async fn admin_and_student(
    resources: &ServerResources,
) -> Result<((User, String), (User, String))> {
    let admin = create_test_user(resources, "admin", UserRole::Admin).await?;
    let student = create_test_user(resources, "student", UserRole::Student).await?;
    let admin_auth = bearer(resources, &admin);
    let student_auth = bearer(resources, &student);
    Ok(((admin, admin_auth), (student, student_auth)))
}

/// Insert a provider platform
pub async fn create_test_provider(
    database: &Database,
    platform_type: ProviderPlatformType,
    base_url: &str,
) -> Result<ProviderPlatform> {
    Ok(database
        .create_provider_platform(&CreateProviderPlatformRequest {
            name: "Test Canvas".to_owned(),
            platform_type,
            description: "fixture".to_owned(),
            icon_url: String::new(),
            account_id: "1".to_owned(),
            access_key: "canvas-access-key".to_owned(),
            base_url: base_url.to_owned(),
            state: ProviderPlatformState::Enabled,
        })
        .await?)
}

/// Insert a program on `provider_platform_id`
pub async fn create_test_program(
    database: &Database,
    provider_platform_id: i64,
    name: &str,
) -> Result<Program> {
    Ok(database
        .create_program(&CreateProgramRequest {
            provider_platform_id,
            name: name.to_owned(),
            description: format!("{name} description"),
            external_id: None,
            thumbnail_url: None,
            is_public: true,
            external_url: None,
        })
        .await?)
}
