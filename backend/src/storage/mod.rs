//! SQLite persistence: the connection, the storage traits and their repositories.

pub mod connection;
pub mod repositories;
pub mod traits;

pub use connection::DbConnection;
