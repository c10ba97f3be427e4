// ABOUTME: Integration tests for program route handlers
// ABOUTME: Tests program CRUD, search, pagination and role checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{
    admin_and_student, create_test_program, create_test_provider, create_test_resources, router,
};
use helpers::axum_test::AxumTestRequest;
use unlocked_server::models::{Program, ProviderPlatformType};

use axum::http::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_program() {
    let resources = create_test_resources().await.unwrap();
    let ((_, admin_auth), _) = admin_and_student(&resources).await.unwrap();
    let provider = create_test_provider(
        &resources.database,
        ProviderPlatformType::Kolibri,
        "https://kolibri.test",
    )
    .await
    .unwrap();

    let response = AxumTestRequest::post("/api/programs")
        .header("authorization", &admin_auth)
        .json(&json!({
            "provider_platform_id": provider.id,
            "name": "Intro to Welding",
            "description": "Safety first",
            "external_id": "course-17",
            "is_public": true
        }))
        .send(router(&resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let program: Program = response.json();
    assert_eq!(program.name, "Intro to Welding");
    assert_eq!(program.provider_platform_id, provider.id);
    assert_eq!(program.external_id.as_deref(), Some("course-17"));
    assert!(program.is_public);
    assert!(program.thumbnail_url.is_none());
}

#[tokio::test]
async fn test_create_program_validation() {
    let resources = create_test_resources().await.unwrap();
    let ((_, admin_auth), (_, student_auth)) = admin_and_student(&resources).await.unwrap();
    let provider = create_test_provider(
        &resources.database,
        ProviderPlatformType::CanvasOss,
        "https://canvas.test",
    )
    .await
    .unwrap();
    let app = router(&resources);

    let unnamed = AxumTestRequest::post("/api/programs")
        .header("authorization", &admin_auth)
        .json(&json!({ "provider_platform_id": provider.id, "name": " " }))
        .send(app.clone())
        .await;
    assert_eq!(unnamed.status_code(), StatusCode::BAD_REQUEST);

    let orphan = AxumTestRequest::post("/api/programs")
        .header("authorization", &admin_auth)
        .json(&json!({ "provider_platform_id": 9999, "name": "Orphan" }))
        .send(app.clone())
        .await;
    assert_eq!(orphan.status_code(), StatusCode::BAD_REQUEST);

    let as_student = AxumTestRequest::post("/api/programs")
        .header("authorization", &student_auth)
        .json(&json!({ "provider_platform_id": provider.id, "name": "Nope" }))
        .send(app)
        .await;
    assert_eq!(as_student.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_students_can_browse_programs() {
    let resources = create_test_resources().await.unwrap();
    let (_, (_, student_auth)) = admin_and_student(&resources).await.unwrap();
    let provider = create_test_provider(
        &resources.database,
        ProviderPlatformType::CanvasCloud,
        "https://canvas.test",
    )
    .await
    .unwrap();
    for name in ["Algebra I", "Algebra II", "Poetry"] {
        create_test_program(&resources.database, provider.id, name)
            .await
            .unwrap();
    }
    let app = router(&resources);

    let all = AxumTestRequest::get("/api/programs")
        .header("authorization", &student_auth)
        .send(app.clone())
        .await;
    assert_eq!(all.status_code(), StatusCode::OK);
    let body: Value = all.json();
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["data"][0]["name"], "Algebra I");

    let search = AxumTestRequest::get("/api/programs?search=algebra&per_page=1")
        .header("authorization", &student_auth)
        .send(app.clone())
        .await;
    let body: Value = search.json();
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["last_page"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let anonymous = AxumTestRequest::get("/api/programs").send(app).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_and_delete_program() {
    let resources = create_test_resources().await.unwrap();
    let ((_, admin_auth), (_, student_auth)) = admin_and_student(&resources).await.unwrap();
    let provider = create_test_provider(
        &resources.database,
        ProviderPlatformType::CanvasCloud,
        "https://canvas.test",
    )
    .await
    .unwrap();
    let program = create_test_program(&resources.database, provider.id, "Draft")
        .await
        .unwrap();
    let app = router(&resources);
    let uri = format!("/api/programs/{}", program.id);

    let updated = AxumTestRequest::patch(&uri)
        .header("authorization", &admin_auth)
        .json(&json!({ "name": "Final", "is_public": false }))
        .send(app.clone())
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let body: Program = updated.json();
    assert_eq!(body.name, "Final");
    assert!(!body.is_public);
    assert_eq!(body.description, "Draft description");

    let fetched = AxumTestRequest::get(&uri)
        .header("authorization", &student_auth)
        .send(app.clone())
        .await;
    let body: Program = fetched.json();
    assert_eq!(body.name, "Final");

    let student_delete = AxumTestRequest::delete(&uri)
        .header("authorization", &student_auth)
        .send(app.clone())
        .await;
    assert_eq!(student_delete.status_code(), StatusCode::FORBIDDEN);

    let deleted = AxumTestRequest::delete(&uri)
        .header("authorization", &admin_auth)
        .send(app.clone())
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = AxumTestRequest::get(&uri)
        .header("authorization", &admin_auth)
        .send(app)
        .await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}
