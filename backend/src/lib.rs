//! # Service Ledger Backend
//!
//! Back-office ledger for a legal-document services counter. Records every
//! service a worker performs, splits its earnings between the worker and the
//! administration, and reshapes the records into the legacy spreadsheet layout
//! the business kept before.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, auth middleware)
//!     ↓
//! Domain Layer (sheet reconstruction, splits, aggregation, services)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize and configure the application state
//! - Set up the REST API router with authentication and CORS
//! - Bootstrap the configured user accounts on first start

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::domain::sheet_import::{HttpSpreadsheetSource, ImportCache, SheetImporter, SpreadsheetSource, SystemClock};
use crate::domain::{AuthService, DashboardService, SettingsService, TransactionService};
use crate::storage::repositories::{
    PercentageRepository, RefreshTokenRepository, TransactionRepository, UserRepository,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub transaction_service: TransactionService,
    pub settings_service: SettingsService,
    pub dashboard_service: DashboardService,
    pub auth_service: AuthService,
    pub jwt: JwtKeys,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.database.url).await?;

    initialize_with(db, config, Arc::new(HttpSpreadsheetSource::new())).await
}

/// Wire services over an open database and a spreadsheet source
pub async fn initialize_with(
    db: DbConnection,
    config: &Config,
    source: Arc<dyn SpreadsheetSource>,
) -> Result<AppState> {
    info!("Setting up domain model");
    let jwt = JwtKeys::new(&config.auth.jwt_secret, config.auth.access_token_minutes);

    let transaction_service = TransactionService::new(Arc::new(TransactionRepository::new(db.clone())));
    let settings_service = SettingsService::new(
        Arc::new(PercentageRepository::new(db.clone())),
        config.splits.default_employee_percentage,
    );
    let importer = Arc::new(SheetImporter::new(
        source,
        ImportCache::new(SystemClock, chrono::Duration::seconds(config.import.cache_ttl_secs)),
    ));
    let dashboard_service =
        DashboardService::new(transaction_service.clone(), settings_service.clone(), importer);
    let auth_service = AuthService::new(
        Arc::new(UserRepository::new(db.clone())),
        Arc::new(RefreshTokenRepository::new(db)),
        jwt.clone(),
        config.auth.refresh_token_days,
    );

    let created = auth_service.bootstrap_users(&config.auth.users).await?;
    if created > 0 {
        info!("Bootstrapped {} user accounts", created);
    }

    info!("Setting up application state");
    Ok(AppState {
        transaction_service,
        settings_service,
        dashboard_service,
        auth_service,
        jwt,
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if allowed.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origins: &[String]) -> Router {
    use crate::auth::middleware::{require_admin, require_auth};
    use crate::io::rest;

    let public_routes = Router::new()
        .route("/auth/login", post(rest::auth_apis::login))
        .route("/auth/refresh", post(rest::auth_apis::refresh))
        .route("/auth/logout", post(rest::auth_apis::logout));

    let authenticated_routes = Router::new()
        .route("/auth/me", get(rest::auth_apis::current_user))
        .route("/services", get(rest::transaction_apis::list_transactions))
        .route("/services/stats/user", get(rest::dashboard_apis::user_stats))
        .route(
            "/settings/employee-percentage",
            get(rest::settings_apis::get_employee_percentage),
        )
        .route("/dashboard/charts", get(rest::dashboard_apis::charts))
        .route("/dashboard/sheet/mine", get(rest::dashboard_apis::employee_sheet))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/services", post(rest::transaction_apis::create_transaction))
        .route("/services/:id", delete(rest::transaction_apis::delete_transaction))
        .route("/services/:id/comment", put(rest::transaction_apis::update_comment))
        .route("/services/stats/admin", get(rest::dashboard_apis::admin_stats))
        .route(
            "/settings/employee-percentage",
            put(rest::settings_apis::set_employee_percentage),
        )
        .route(
            "/settings/employee-percentage/history",
            get(rest::settings_apis::percentage_history),
        )
        .route("/dashboard/sheet", get(rest::dashboard_apis::sheet))
        .route("/dashboard/table", get(rest::dashboard_apis::table))
        .route("/import/sheet", post(rest::import_apis::import_sheet))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), require_admin));

    let api_routes = public_routes.merge(authenticated_routes).merge(admin_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(app_state)
}
