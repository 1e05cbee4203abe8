//! # REST API for Split Settings
//!
//! Reads and changes the effective-dated employee percentage.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::AppState;
use shared::SetEmployeePercentageRequest;

/// Percentage in force today
pub async fn get_employee_percentage(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/employee-percentage");

    match state.settings_service.current_percentage().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to read employee percentage: {}", e);
            e.into_response()
        }
    }
}

/// Add a setting that applies from `startDate` onwards
pub async fn set_employee_percentage(
    State(state): State<AppState>,
    Json(request): Json<SetEmployeePercentageRequest>,
) -> impl IntoResponse {
    info!("PUT /api/settings/employee-percentage - request: {:?}", request);

    match state.settings_service.set_employee_percentage(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to set employee percentage: {}", e);
            e.into_response()
        }
    }
}

pub async fn percentage_history(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/employee-percentage/history");

    match state.settings_service.list_history().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list percentage history: {}", e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use shared::{EmployeePercentageResponse, PercentageHistoryResponse};

    #[tokio::test]
    async fn test_default_percentage_visible_to_employees() {
        let app = test_app(StaticSource::default()).await;
        let hengi = login(&app, HENGI).await.access_token;

        let (status, body) = send(&app, get("/api/settings/employee-percentage", Some(&hengi))).await;
        assert_eq!(status, StatusCode::OK);
        let current: EmployeePercentageResponse = decode(body);
        assert_eq!(current.percentage, Decimal::new(50, 0));
        assert_eq!(current.effective_date, None);
    }

    #[tokio::test]
    async fn test_admin_sets_percentage() {
        let app = test_app(StaticSource::default()).await;
        let admin = login(&app, ADMIN).await.access_token;

        let (status, body) = send(
            &app,
            json(
                "PUT",
                "/api/settings/employee-percentage",
                Some(&admin),
                json!({ "percentage": 60, "startDate": "2000-01-01" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode::<EmployeePercentageResponse>(body).admin_percentage, Decimal::new(40, 0));

        let (_, body) = send(&app, get("/api/settings/employee-percentage", Some(&admin))).await;
        assert_eq!(decode::<EmployeePercentageResponse>(body).percentage, Decimal::new(60, 0));

        let (status, body) = send(&app, get("/api/settings/employee-percentage/history", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode::<PercentageHistoryResponse>(body).history.len(), 1);
    }

    #[tokio::test]
    async fn test_percentage_rules() {
        let app = test_app(StaticSource::default()).await;
        let admin = login(&app, ADMIN).await.access_token;
        let hengi = login(&app, HENGI).await.access_token;

        let (status, _) = send(
            &app,
            json(
                "PUT",
                "/api/settings/employee-percentage",
                Some(&admin),
                json!({ "percentage": 120, "startDate": "2024-01-01" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json(
                "PUT",
                "/api/settings/employee-percentage",
                Some(&hengi),
                json!({ "percentage": 90, "startDate": "2024-01-01" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, get("/api/settings/employee-percentage/history", Some(&hengi))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
