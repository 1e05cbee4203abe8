use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shared::{Role, TokenClaims, Worker};

use crate::errors::ApiError;

/// Claims of the caller, inserted by [`super::middleware::require_auth`]
///
/// Usage in handlers: `async fn handler(CurrentUser(claims): CurrentUser) -> Response`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub TokenClaims);

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.0.role == Role::Admin
    }

    /// Worker column the caller is limited to; `None` for admins
    pub fn scope(&self) -> Result<Option<Worker>, ApiError> {
        match self.0.role {
            Role::Admin => Ok(None),
            Role::Employee => self
                .0
                .worker
                .map(Some)
                .ok_or_else(|| ApiError::Forbidden("Employee account has no worker column".to_string())),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))
    }
}
