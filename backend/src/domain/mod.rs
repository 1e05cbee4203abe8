//! Domain logic: the sheet reconstructor, the split calculator, aggregation
//! and the services the REST layer calls.

pub mod aggregation;
pub mod auth_service;
pub mod catalog;
pub mod dashboard_service;
pub mod models;
pub mod settings_service;
pub mod sheet;
pub mod sheet_import;
pub mod sheet_view;
pub mod splits;
pub mod transaction_service;

pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use settings_service::SettingsService;
pub use transaction_service::TransactionService;
