use crate::domain::models::User;
use crate::storage::connection::DbConnection;
use crate::storage::traits::UserStorage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{Role, Worker};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let role: String = row.get("role");
        let worker: Option<String> = row.get("worker");

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            role: Role::from_string(&role).map_err(|e| anyhow!(e))?,
            worker: worker.as_deref().map(str::parse::<Worker>).transpose()?,
        })
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        worker: Option<Worker>,
    ) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, role, worker) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(worker.map(|w| w.as_str()))
        .execute(self.db.pool())
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            worker,
        })
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash, role, worker FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, worker FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn count_users(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.get("n"))
    }
}
