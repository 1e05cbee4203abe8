//! # Service Ledger Client
//!
//! Typed async client for the service ledger REST API, used by front ends
//! and scripts.
//!
//! ## Key Responsibilities
//!
//! - Wrap every endpoint in a typed method returning shared DTOs
//! - Keep the login session and refresh the access token transparently
//! - Map HTTP failures onto [`ClientError`]
//! - Drop responses that arrive after a newer request for the same data

pub mod api;
pub mod error;
pub mod generation;
pub mod session;

pub use api::{ApiClient, ChartsQuery, SheetQuery};
pub use error::{ClientError, ClientResult};
pub use generation::{LatestSnapshot, RequestGeneration};
pub use session::{Credentials, Session, TokenRefresher};
