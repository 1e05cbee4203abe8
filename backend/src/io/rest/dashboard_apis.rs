//! # REST API for the Dashboard
//!
//! Summary stats, the legacy sheet view, the per-worker table and chart
//! series. Employees get their own column only; admins may ask for any.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::CurrentUser;
use crate::domain::aggregation::DateFilterQuery;
use crate::domain::dashboard_service::SheetOptions;
use crate::domain::sheet_view::SortDirection;
use crate::errors::{ApiError, ApiResult, ValidationError};
use crate::AppState;
use shared::{TransactionListRequest, Worker};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerQuery {
    pub worker: Option<Worker>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl WorkerQuery {
    fn range(&self) -> TransactionListRequest {
        TransactionListRequest {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub worker: Option<Worker>,
    pub sort_by: Option<Worker>,
    pub direction: Option<SortDirection>,
}

// Flattening DateFilterQuery breaks typed fields in query strings, so the
// fields are repeated here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartsQuery {
    pub filter: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub show_all: bool,
}

/// Employees are pinned to their column; admins must name one
fn target_worker(user: &CurrentUser, requested: Option<Worker>) -> ApiResult<Worker> {
    match user.scope()? {
        Some(own) => Ok(own),
        None => requested.ok_or_else(|| {
            ValidationError::InvalidQuery("worker is required for admin accounts".to_string()).into()
        }),
    }
}

fn respond<T: serde::Serialize>(result: ApiResult<T>, what: &str) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            if matches!(e, ApiError::Internal(_)) {
                error!("Failed to build {}: {}", what, e);
            }
            e.into_response()
        }
    }
}

/// Totals for every worker plus the administration's grand total
pub async fn admin_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/services/stats/admin");
    respond(state.dashboard_service.admin_stats().await, "admin stats")
}

pub async fn user_stats(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WorkerQuery>,
) -> impl IntoResponse {
    info!("GET /api/services/stats/user - user: {}, query: {:?}", user.0.username, query);

    let result = match target_worker(&user, query.worker) {
        Ok(worker) => state.dashboard_service.user_stats(worker).await,
        Err(e) => Err(e),
    };
    respond(result, "user stats")
}

/// Live transactions laid out as the legacy sheet
pub async fn sheet(State(state): State<AppState>, Query(query): Query<SheetQuery>) -> impl IntoResponse {
    info!("GET /api/dashboard/sheet - query: {:?}", query);

    let options = SheetOptions {
        range: TransactionListRequest {
            start_date: query.start_date,
            end_date: query.end_date,
        },
        search: query.search,
        worker: query.worker,
        sort_by: query.sort_by,
        direction: query.direction.unwrap_or_default(),
    };
    respond(state.dashboard_service.sheet(&options).await, "sheet")
}

/// The caller's own column of the sheet with its closing total
pub async fn employee_sheet(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WorkerQuery>,
) -> impl IntoResponse {
    info!("GET /api/dashboard/sheet/mine - user: {}, query: {:?}", user.0.username, query);

    let result = match target_worker(&user, query.worker) {
        Ok(worker) => state.dashboard_service.employee_sheet(worker, &query.range()).await,
        Err(e) => Err(e),
    };
    respond(result, "employee sheet")
}

pub async fn table(
    State(state): State<AppState>,
    Query(range): Query<TransactionListRequest>,
) -> impl IntoResponse {
    info!("GET /api/dashboard/table - query: {:?}", range);
    respond(state.dashboard_service.table(&range).await, "table")
}

pub async fn charts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ChartsQuery>,
) -> impl IntoResponse {
    info!("GET /api/dashboard/charts - user: {}, query: {:?}", user.0.username, query);

    let filter = DateFilterQuery {
        filter: query.filter,
        date: query.date,
        start_date: query.start_date,
        end_date: query.end_date,
    }
    .to_filter()
    .map_err(|e| ApiError::from(ValidationError::InvalidQuery(e)));

    let result = match (filter, user.scope()) {
        (Ok(filter), Ok(scope)) => state.dashboard_service.charts(&filter, query.show_all, scope).await,
        (Err(e), _) | (_, Err(e)) => Err(e),
    };
    respond(result, "charts")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use axum::Router;
    use rust_decimal::Decimal;
    use serde_json::json;
    use shared::{
        AdminStatsResponse, AdminTableResponse, ChartsResponse, DetailKind, EmployeeSheetResponse, SheetRow,
        UserStatsResponse, Worker,
    };

    async fn seeded_app() -> (Router, String, String) {
        let app = test_app(StaticSource::default()).await;
        let admin = login(&app, ADMIN).await.access_token;
        let hengi = login(&app, HENGI).await.access_token;

        let services = [
            ("HENGI", "SERVICIO DE IMPRESION", 100.0, "2024-05-01"),
            ("ISRAEL", "SERVICIO MENSAJERIA", 50.0, "2024-05-02"),
            ("HENGI", "SERVICIO MENSAJERIA", 30.0, "2024-05-02"),
        ];
        for (worker, name, earnings, date) in services {
            let (status, _) = send(
                &app,
                json(
                    "POST",
                    "/api/services",
                    Some(&admin),
                    json!({ "worker": worker, "serviceName": name, "earnings": earnings, "date": date }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        (app, admin, hengi)
    }

    #[tokio::test]
    async fn test_admin_stats_split_at_default() {
        let (app, admin, hengi) = seeded_app().await;

        let (status, body) = send(&app, get("/api/services/stats/admin", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        let stats: AdminStatsResponse = decode(body);
        assert_eq!(stats.admin_total, Decimal::new(90, 0));
        let hengi_totals = stats.workers.iter().find(|w| w.worker == Worker::Hengi).unwrap();
        assert_eq!(hengi_totals.total, Decimal::new(130, 0));
        assert_eq!(hengi_totals.employee_share, Decimal::new(65, 0));

        let (status, _) = send(&app, get("/api/services/stats/admin", Some(&hengi))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_user_stats_are_scoped() {
        let (app, admin, hengi) = seeded_app().await;

        // the worker parameter is ignored for employees
        let (status, body) = send(&app, get("/api/services/stats/user?worker=ISRAEL", Some(&hengi))).await;
        assert_eq!(status, StatusCode::OK);
        let stats: UserStatsResponse = decode(body);
        assert_eq!(stats.totals.worker, Worker::Hengi);
        assert_eq!(stats.service_count, 2);

        let (status, _) = send(&app, get("/api/services/stats/user", Some(&admin))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, get("/api/services/stats/user?worker=israel", Some(&admin))).await;
        assert_eq!(decode::<UserStatsResponse>(body).totals.total, Decimal::new(50, 0));
    }

    #[tokio::test]
    async fn test_sheet_view_filters() {
        let (app, admin, _) = seeded_app().await;

        let (status, body) = send(&app, get("/api/dashboard/sheet", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        let rows: Vec<SheetRow> = decode(body);
        let services: Vec<_> = rows.iter().filter(|r| r.is(DetailKind::Servicio)).collect();
        assert_eq!(services.len(), 2);
        assert!(services[0].ids.contains_key(&Worker::Hengi));

        let (_, body) = send(&app, get("/api/dashboard/sheet?worker=ISRAEL", Some(&admin))).await;
        let rows: Vec<SheetRow> = decode(body);
        assert!(rows.iter().all(|r| r.cells.keys().all(|w| *w == Worker::Israel)));

        let (_, body) = send(&app, get("/api/dashboard/sheet?search=impresion", Some(&admin))).await;
        let rows: Vec<SheetRow> = decode(body);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is(DetailKind::Servicio));
    }

    #[tokio::test]
    async fn test_employee_sheet() {
        let (app, admin, hengi) = seeded_app().await;

        let (status, body) = send(&app, get("/api/dashboard/sheet/mine", Some(&hengi))).await;
        assert_eq!(status, StatusCode::OK);
        let mine: EmployeeSheetResponse = decode(body);
        assert_eq!(mine.worker, Worker::Hengi);
        assert_eq!(mine.entries.len(), 2);
        let total = mine.total.unwrap();
        assert_eq!(total.label, "Total HENGI (50%)");
        assert_eq!(total.employee_share, Decimal::new(65, 0));

        let (status, _) = send(&app, get("/api/dashboard/sheet/mine", Some(&admin))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, get("/api/dashboard/sheet/mine?worker=THAICAR", Some(&admin))).await;
        let empty: EmployeeSheetResponse = decode(body);
        assert!(empty.entries.is_empty());
        assert!(empty.total.is_none());
    }

    #[tokio::test]
    async fn test_employee_sheet_total_follows_dated_rates() {
        let app = test_app(StaticSource::default()).await;
        let admin = login(&app, ADMIN).await.access_token;
        let hengi = login(&app, HENGI).await.access_token;

        let service = json!({
            "worker": "HENGI",
            "serviceName": "SERVICIO DE IMPRESION",
            "earnings": 100,
            "date": "2024-02-01",
        });
        let (status, _) = send(&app, json("POST", "/api/services", Some(&admin), service)).await;
        assert_eq!(status, StatusCode::CREATED);

        let rate = json!({ "percentage": 80, "startDate": "2024-06-01" });
        let (status, _) = send(&app, json("PUT", "/api/settings/employee-percentage", Some(&admin), rate)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get("/api/services/stats/user", Some(&hengi))).await;
        let stats: UserStatsResponse = decode(body);
        assert_eq!(stats.totals.employee_share, Decimal::new(50, 0));

        let (_, body) = send(&app, get("/api/dashboard/sheet/mine", Some(&hengi))).await;
        let total = decode::<EmployeeSheetResponse>(body).total.unwrap();
        assert_eq!(total.employee_share, stats.totals.employee_share);
        assert_eq!(total.label, "Total HENGI (50%)");
    }

    #[tokio::test]
    async fn test_table_groups_entries() {
        let (app, admin, _) = seeded_app().await;

        let (status, body) = send(&app, get("/api/dashboard/table?startDate=2024-05-02", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        let table: AdminTableResponse = decode(body);
        assert_eq!(table.entries[&Worker::Hengi].len(), 1);
        assert_eq!(table.entries[&Worker::Israel].len(), 1);
        assert_eq!(table.entries[&Worker::Hengi][0].service, "SERVICIO MENSAJERIA");
        assert_eq!(table.admin_total, Decimal::new(40, 0));
    }

    #[tokio::test]
    async fn test_charts_scope_and_filters() {
        let (app, admin, hengi) = seeded_app().await;

        let (status, body) = send(&app, get("/api/dashboard/charts", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        let charts: ChartsResponse = decode(body);
        assert_eq!(charts.timeline.len(), 2);
        assert_eq!(charts.timeline[0].name, "1 may");
        assert_eq!(charts.distribution.len(), 2);

        let (_, body) = send(
            &app,
            get("/api/dashboard/charts?filter=specific&date=2024-05-02", Some(&hengi)),
        )
        .await;
        let charts: ChartsResponse = decode(body);
        assert_eq!(charts.distribution.len(), 1);
        assert_eq!(charts.distribution[0].worker, Worker::Hengi);
        assert_eq!(charts.distribution[0].total, Decimal::new(30, 0));

        let (status, _) = send(&app, get("/api/dashboard/charts?filter=weekly", Some(&admin))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
