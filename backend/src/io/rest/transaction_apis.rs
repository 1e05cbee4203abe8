//! # REST API for Services
//!
//! Endpoints for listing, recording, commenting and deleting the services
//! performed by workers. Employees only list their own column.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::auth::CurrentUser;
use crate::AppState;
use shared::{CreateTransactionRequest, TransactionListRequest, UpdateCommentRequest};

/// List services in date order, optionally bounded by `startDate`/`endDate`
pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TransactionListRequest>,
) -> impl IntoResponse {
    info!("GET /api/services - user: {}, query: {:?}", user.0.username, query);

    let scope = match user.scope() {
        Ok(scope) => scope,
        Err(e) => return e.into_response(),
    };

    match state.transaction_service.list_transactions(&query, scope).await {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(e) => {
            error!("Failed to list services: {}", e);
            e.into_response()
        }
    }
}

/// Record a new service
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/services - request: {:?}", request);

    match state.transaction_service.create_transaction(request).await {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(e) => {
            error!("Failed to create service: {}", e);
            e.into_response()
        }
    }
}

/// Replace the comment of a service
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCommentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/services/{}/comment", id);

    match state.transaction_service.update_comment(id, request).await {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(e) => {
            error!("Failed to update comment of service {}: {}", id, e);
            e.into_response()
        }
    }
}

pub async fn delete_transaction(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("DELETE /api/services/{}", id);

    match state.transaction_service.delete_transaction(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete service {}: {}", id, e);
            e.into_response()
        }
    }
}
