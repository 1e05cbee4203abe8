//! # REST API Interface Layer
//!
//! HTTP endpoints of the service ledger, all mounted under `/api`.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: JSON interfaces for services, settings, dashboard and auth
//! - **Access Scoping**: Employees only ever see their own worker column
//! - **Error Handling**: Domain errors become status codes through [`crate::errors::ApiError`]
//! - **Logging**: Every request is logged with its parameters

pub mod auth_apis;
pub mod dashboard_apis;
pub mod import_apis;
pub mod settings_apis;
pub mod transaction_apis;

#[cfg(test)]
pub(crate) mod test_support;
