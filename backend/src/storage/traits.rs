//! # Storage Traits
//!
//! Async storage interfaces the domain services depend on. The SQLite
//! repositories in [`crate::storage::repositories`] implement them.

use crate::domain::models::{NewTransaction, RefreshTokenRecord, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{PercentageSetting, Role, Transaction, Worker};

#[async_trait]
pub trait TransactionStorage: Send + Sync {
    /// Persist a new transaction and return it with its assigned id
    async fn store_transaction(&self, transaction: &NewTransaction) -> Result<Transaction>;

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>>;

    /// Transactions ordered by date, then by id, with inclusive optional bounds
    async fn list_transactions(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>>;

    /// Returns false when no transaction has this id
    async fn update_comment(&self, id: i64, comment: Option<&str>) -> Result<bool>;

    /// Returns false when no transaction has this id
    async fn delete_transaction(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait PercentageStorage: Send + Sync {
    async fn store_setting(&self, setting: &PercentageSetting) -> Result<()>;

    /// Every setting, in insertion order
    async fn list_settings(&self) -> Result<Vec<PercentageSetting>>;
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        worker: Option<Worker>,
    ) -> Result<User>;

    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn count_users(&self) -> Result<i64>;
}

#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    async fn store_token(&self, record: &RefreshTokenRecord) -> Result<()>;

    async fn find_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Returns false when the token was unknown or already revoked
    async fn revoke_token(&self, token_hash: &str) -> Result<bool>;
}
