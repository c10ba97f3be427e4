// ABOUTME: Integration tests for the SQLite database layer
// ABOUTME: Tests encryption at rest, cascading deletes, fresh migrations and file-backed persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_database, create_test_program, create_test_provider};
use unlocked_server::database::{
    generate_encryption_key, ActivityFilter, CreateActivityRequest, Database, NewUser,
};
use unlocked_server::models::{ActivityType, NewOidcClient, ProviderPlatformType, User, UserRole};
use unlocked_server::pagination::PaginationParams;

use axum::http::StatusCode;
use tempfile::TempDir;

async fn insert_user(db: &Database, username: &str) -> User {
    db.create_user(&NewUser {
        username: username.to_owned(),
        name_first: "Db".to_owned(),
        name_last: "Test".to_owned(),
        email: format!("{username}@example.com"),
        password_hash: "$2b$04$notarealhashbutnotchecked".to_owned(),
        role: UserRole::Student,
        password_reset: true,
    })
    .await
    .unwrap()
}

fn oidc_client(provider_platform_id: i64) -> NewOidcClient {
    NewOidcClient {
        provider_platform_id,
        client_id: "client-abc".to_owned(),
        client_name: "Canvas".to_owned(),
        client_secret: "very-secret".to_owned(),
        redirect_uris: "https://canvas.test/login/oauth2/callback".to_owned(),
        scopes: "openid profile email".to_owned(),
    }
}

#[tokio::test]
async fn test_secrets_are_encrypted_at_rest() {
    let db = create_test_database().await.unwrap();
    let provider = create_test_provider(&db, ProviderPlatformType::CanvasCloud, "https://canvas.test")
        .await
        .unwrap();
    db.create_oidc_client(&oidc_client(provider.id)).await.unwrap();

    let raw_key: String = sqlx::query_scalar("SELECT access_key FROM provider_platforms WHERE id = $1")
        .bind(provider.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_ne!(raw_key, "canvas-access-key");
    assert_eq!(db.decrypt_data(&raw_key).unwrap(), "canvas-access-key");

    let raw_secret: String =
        sqlx::query_scalar("SELECT client_secret FROM oidc_clients WHERE provider_platform_id = $1")
            .bind(provider.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_ne!(raw_secret, "very-secret");

    let client = db
        .get_oidc_client_by_provider(provider.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(client.client_secret, "very-secret");
}

#[tokio::test]
async fn test_one_oidc_client_per_provider() {
    let db = create_test_database().await.unwrap();
    let provider = create_test_provider(&db, ProviderPlatformType::CanvasCloud, "https://canvas.test")
        .await
        .unwrap();

    db.create_oidc_client(&oidc_client(provider.id)).await.unwrap();
    let err = db
        .create_oidc_client(&oidc_client(provider.id))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), StatusCode::CONFLICT);

    let orphan = db.create_oidc_client(&oidc_client(9999)).await.unwrap_err();
    assert_eq!(orphan.http_status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_provider_cascades() {
    let db = create_test_database().await.unwrap();
    let user = insert_user(&db, "learner").await;
    let provider = create_test_provider(&db, ProviderPlatformType::CanvasCloud, "https://canvas.test")
        .await
        .unwrap();
    let program = create_test_program(&db, provider.id, "Algebra").await.unwrap();
    db.create_activity(
        user.id,
        &CreateActivityRequest {
            program_id: program.id,
            activity_type: ActivityType::Complete,
            total_time: 60,
            external_id: Some("ext-1".to_owned()),
        },
    )
    .await
    .unwrap();
    db.create_oidc_client(&oidc_client(provider.id)).await.unwrap();

    assert!(db.delete_provider_platform(provider.id).await.unwrap());

    assert!(db.get_program(program.id).await.unwrap().is_none());
    assert!(db.list_oidc_clients().await.unwrap().is_empty());
    let (count, activities) = db
        .get_activity_by_user_id(user.id, &ActivityFilter::default(), &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(activities.is_empty());
    assert!(!db.delete_provider_platform(provider.id).await.unwrap());
}

#[tokio::test]
async fn test_deleting_user_removes_activity() {
    let db = create_test_database().await.unwrap();
    let user = insert_user(&db, "learner").await;
    let provider = create_test_provider(&db, ProviderPlatformType::Kolibri, "https://kolibri.test")
        .await
        .unwrap();
    let program = create_test_program(&db, provider.id, "Reading").await.unwrap();
    db.create_activity(
        user.id,
        &CreateActivityRequest {
            program_id: program.id,
            activity_type: ActivityType::Start,
            total_time: 15,
            external_id: None,
        },
    )
    .await
    .unwrap();

    assert!(db.delete_user(user.id).await.unwrap());

    let (count, _) = db
        .get_activity_by_program_id(program.id, &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_migrate_fresh_resets_schema() {
    let db = create_test_database().await.unwrap();
    insert_user(&db, "before").await;
    assert_eq!(db.get_user_count().await.unwrap(), 1);

    db.migrate_fresh().await.unwrap();
    assert_eq!(db.get_user_count().await.unwrap(), 0);

    // Pending-migration runs are idempotent
    db.migrate().await.unwrap();
    insert_user(&db, "after").await;
    assert_eq!(db.get_user_count().await.unwrap(), 1);
    db.health_check().await.unwrap();
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("unlocked.db").display());
    let key = generate_encryption_key().to_vec();

    let provider_id = {
        let db = Database::new(&url, key.clone()).await.unwrap();
        insert_user(&db, "persisted").await;
        create_test_provider(&db, ProviderPlatformType::CanvasOss, "https://canvas.test")
            .await
            .unwrap()
            .id
    };

    let reopened = Database::new(&url, key).await.unwrap();
    assert!(reopened
        .get_user_by_username("persisted")
        .await
        .unwrap()
        .is_some());
    let provider = reopened
        .get_provider_platform(provider_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(provider.access_key, "canvas-access-key");

    // Secrets written under one key cannot be read with another
    let wrong_key = Database::connect(&url, vec![9u8; 32]).await.unwrap();
    assert!(wrong_key.get_provider_platform(provider_id).await.is_err());
}

#[tokio::test]
async fn test_encryption_key_length_is_checked() {
    let result = Database::connect("sqlite::memory:", vec![1u8; 16]).await;
    assert!(result.is_err());
}
