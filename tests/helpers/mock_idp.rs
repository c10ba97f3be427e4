// ABOUTME: Local axum server standing in for the Hydra admin API and a Canvas instance
// ABOUTME: Records every request it receives and answers per a configurable behaviour
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::form_urlencoded;

/// How the fake services answer
#[derive(Clone)]
pub struct MockIdpBehaviour {
    /// Status returned by `POST /admin/clients`
    pub hydra_status: StatusCode,
    /// Echo a different redirect URI than requested
    pub hydra_wrong_redirect: bool,
    /// Status returned by the Canvas authentication_providers endpoint
    pub canvas_status: StatusCode,
    /// `id` field in the Canvas response
    pub canvas_id: Value,
}

impl Default for MockIdpBehaviour {
    fn default() -> Self {
        Self {
            hydra_status: StatusCode::CREATED,
            hydra_wrong_redirect: false,
            canvas_status: StatusCode::OK,
            canvas_id: json!(42),
        }
    }
}

/// A request received by the fake Hydra
#[derive(Debug, Clone)]
pub struct HydraCall {
    pub authorization: Option<String>,
    pub body: Value,
}

/// A request received by the fake Canvas
#[derive(Debug, Clone)]
pub struct CanvasCall {
    pub account_id: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub form: HashMap<String, String>,
}

struct MockState {
    behaviour: MockIdpBehaviour,
    hydra_calls: Mutex<Vec<HydraCall>>,
    canvas_calls: Mutex<Vec<CanvasCall>>,
}

/// Running fake identity provider
pub struct MockIdp {
    pub base_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockIdp {
    pub async fn start(behaviour: MockIdpBehaviour) -> Self {
        let state = Arc::new(MockState {
            behaviour,
            hydra_calls: Mutex::new(Vec::new()),
            canvas_calls: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/admin/clients", post(create_client))
            .route(
                "/api/v1/accounts/:account_id/authentication_providers",
                post(create_authentication_provider),
            )
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn hydra_calls(&self) -> Vec<HydraCall> {
        self.state.hydra_calls.lock().unwrap().clone()
    }

    pub fn canvas_calls(&self) -> Vec<CanvasCall> {
        self.state.canvas_calls.lock().unwrap().clone()
    }
}

impl Drop for MockIdp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn create_client(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let call_number = {
        let mut calls = state.hydra_calls.lock().unwrap();
        calls.push(HydraCall {
            authorization: header_value(&headers, header::AUTHORIZATION),
            body: body.clone(),
        });
        calls.len()
    };

    let behaviour = &state.behaviour;
    if !behaviour.hydra_status.is_success() {
        return (behaviour.hydra_status, Json(json!({ "error": "rejected" }))).into_response();
    }

    let redirect_uris = if behaviour.hydra_wrong_redirect {
        json!(["https://elsewhere.test/callback"])
    } else {
        body["redirect_uris"].clone()
    };

    (
        behaviour.hydra_status,
        Json(json!({
            "client_id": format!("client-{call_number}"),
            "client_name": body["client_name"],
            "client_secret": format!("secret-{call_number}"),
            "redirect_uris": redirect_uris,
            "scope": body["scope"],
        })),
    )
        .into_response()
}

async fn create_authentication_provider(
    State(state): State<Arc<MockState>>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let form = form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect::<HashMap<String, String>>();
    state.canvas_calls.lock().unwrap().push(CanvasCall {
        account_id,
        authorization: header_value(&headers, header::AUTHORIZATION),
        accept: header_value(&headers, header::ACCEPT),
        form,
    });

    let behaviour = &state.behaviour;
    (
        behaviour.canvas_status,
        Json(json!({ "id": behaviour.canvas_id, "auth_type": "openid_connect" })),
    )
        .into_response()
}
