use crate::domain::splits::SplitOverflow;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use shared::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// Input rejected before it reaches storage
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unknown worker: {0}")]
    UnknownWorker(String),

    #[error("Service name must not be empty")]
    EmptyServiceName,

    #[error("Earnings must not be negative")]
    NegativeEarnings,

    #[error("Earnings can have at most two decimal places")]
    EarningsPrecision,

    #[error("Earnings must be at most {max}")]
    EarningsTooLarge { max: Decimal },

    #[error("Comment must be at most {max} characters")]
    CommentTooLong { max: usize },

    #[error("Percentage must be between 0 and 100")]
    PercentageOutOfRange,

    #[error("{0}")]
    InvalidQuery(String),
}

/// Errors surfaced by the REST layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(e) => {
                error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<SplitOverflow> for ApiError {
    fn from(e: SplitOverflow) -> Self {
        ApiError::Internal(e.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(ValidationError::EmptyServiceName).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(anyhow::anyhow!("disk on fire")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::from(SplitOverflow).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = ApiError::from(anyhow::anyhow!("disk on fire")).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Internal server error");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::CommentTooLong { max: 500 }.to_string(),
            "Comment must be at most 500 characters"
        );
        assert_eq!(ValidationError::UnknownWorker("PEDRO".into()).to_string(), "Unknown worker: PEDRO");
    }
}
