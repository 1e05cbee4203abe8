//! Records that live only on the server side of the API.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{Role, UserInfo, Worker};

/// A transaction that has passed validation but has no id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub worker: Worker,
    pub service_name: String,
    pub client: Option<String>,
    pub time: Option<String>,
    pub earnings: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    /// Column an employee reads from; admins have none
    pub worker: Option<Worker>,
}

impl User {
    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            worker: self.worker,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTokenRecord {
    /// Hex SHA-256 of the opaque token handed to the client
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}
