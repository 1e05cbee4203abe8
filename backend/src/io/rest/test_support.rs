//! Router harness shared by the REST handler tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{LoginResponse, Role, Worker};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::{BootstrapUser, Config};
use crate::domain::sheet_import::SpreadsheetSource;
use crate::storage::DbConnection;
use crate::{create_router, initialize_with};

pub const ADMIN: (&str, &str) = ("admin", "clave-admin");
pub const HENGI: (&str, &str) = ("hengi", "clave-hengi");

/// Serves canned workbook bytes keyed by URL
#[derive(Default)]
pub struct StaticSource {
    pub files: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl SpreadsheetSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("No spreadsheet at {}", url))
    }
}

pub async fn test_app(source: StaticSource) -> Router {
    let mut config = Config::embedded_default().expect("embedded config");
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.users = vec![
        BootstrapUser {
            username: ADMIN.0.to_string(),
            password: ADMIN.1.to_string(),
            role: Role::Admin,
            worker: None,
        },
        BootstrapUser {
            username: HENGI.0.to_string(),
            password: HENGI.1.to_string(),
            role: Role::Employee,
            worker: Some(Worker::Hengi),
        },
    ];

    let db = DbConnection::init_test().await.expect("test database");
    let state = initialize_with(db, &config, Arc::new(source))
        .await
        .expect("app state");
    create_router(state, &[])
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    with_token(Request::get(uri), token).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    with_token(Request::delete(uri), token).body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_token(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_token(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub async fn login(app: &Router, (username, password): (&str, &str)) -> LoginResponse {
    let (status, body) = send(
        app,
        json(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    decode(body)
}

pub fn decode<T: DeserializeOwned>(body: Value) -> T {
    serde_json::from_value(body).expect("response shape")
}
