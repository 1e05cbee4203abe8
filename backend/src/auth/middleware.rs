use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use shared::{Role, TokenClaims};
use tracing::debug;

use crate::errors::ApiError;
use crate::AppState;

fn bearer_claims(state: &AppState, req: &Request) -> Result<TokenClaims, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    state.jwt.validate_token(token).map_err(|e| {
        debug!("Rejected access token: {:?}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })
}

/// Requires a valid access token and exposes its claims to handlers
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like [`require_auth`], for admin-only routes
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state, &req)?;
    if claims.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
