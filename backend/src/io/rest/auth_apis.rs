//! # REST API for Authentication
//!
//! Login issues a short-lived access token plus a refresh token. The refresh
//! token can mint new access tokens until it expires or the user logs out.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::AppState;
use shared::{LoginRequest, RefreshRequest};

pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> impl IntoResponse {
    // never log the password
    info!("POST /api/auth/login - username: {}", request.username);

    match state.auth_service.login(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Login rejected: {}", e);
            e.into_response()
        }
    }
}

pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> impl IntoResponse {
    info!("POST /api/auth/refresh");

    match state.auth_service.refresh(&request.refresh_token).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Refresh rejected: {}", e);
            e.into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> impl IntoResponse {
    info!("POST /api/auth/logout");

    match state.auth_service.logout(&request.refresh_token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Profile of the caller
pub async fn current_user(State(state): State<AppState>, CurrentUser(claims): CurrentUser) -> impl IntoResponse {
    info!("GET /api/auth/me - user: {}", claims.username);

    match state.auth_service.current_user(claims.sub).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use shared::{RefreshResponse, Role, UserInfo, Worker};

    #[tokio::test]
    async fn test_login_and_me() {
        let app = test_app(StaticSource::default()).await;
        let session = login(&app, HENGI).await;
        assert_eq!(session.user.worker, Some(Worker::Hengi));

        let (status, body) = send(&app, get("/api/auth/me", Some(&session.access_token))).await;
        assert_eq!(status, StatusCode::OK);
        let me: UserInfo = decode(body);
        assert_eq!(me.username, "hengi");
        assert_eq!(me.role, Role::Employee);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let app = test_app(StaticSource::default()).await;

        let (status, body) = send(
            &app,
            json("POST", "/api/auth/login", None, json!({ "username": "admin", "password": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");
    }

    #[tokio::test]
    async fn test_refresh_then_logout() {
        let app = test_app(StaticSource::default()).await;
        let session = login(&app, ADMIN).await;
        let body = json!({ "refreshToken": session.refresh_token });

        let (status, refreshed) = send(&app, json("POST", "/api/auth/refresh", None, body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let refreshed: RefreshResponse = decode(refreshed);

        let (status, _) = send(&app, get("/api/auth/me", Some(&refreshed.access_token))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, json("POST", "/api/auth/logout", None, body.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, json("POST", "/api/auth/refresh", None, body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
