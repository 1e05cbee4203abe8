use crate::domain::models::RefreshTokenRecord;
use crate::storage::connection::DbConnection;
use crate::storage::traits::RefreshTokenStorage;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

#[derive(Clone)]
pub struct RefreshTokenRepository {
    db: DbConnection,
}

impl RefreshTokenRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenStorage for RefreshTokenRepository {
    async fn store_token(&self, record: &RefreshTokenRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token_hash, user_id, expires_at, revoked) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.token_hash)
        .bind(record.user_id)
        .bind(record.expires_at.to_rfc3339())
        .bind(record.revoked)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        let row = sqlx::query(
            "SELECT token_hash, user_id, expires_at, revoked FROM refresh_tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => {
                let expires_at: String = r.get("expires_at");
                Ok(Some(RefreshTokenRecord {
                    token_hash: r.get("token_hash"),
                    user_id: r.get("user_id"),
                    expires_at: DateTime::parse_from_rfc3339(&expires_at)?.with_timezone(&Utc),
                    revoked: r.get("revoked"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token_hash = ? AND revoked = 0")
            .bind(token_hash)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repositories::UserRepository;
    use crate::storage::traits::UserStorage;
    use chrono::Duration;
    use shared::Role;

    #[tokio::test]
    async fn test_store_find_and_revoke() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let user = UserRepository::new(db.clone())
            .create_user("admin", "hash", Role::Admin, None)
            .await
            .unwrap();
        let repo = RefreshTokenRepository::new(db);

        let record = RefreshTokenRecord {
            token_hash: "abc123".to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::days(7),
            revoked: false,
        };
        repo.store_token(&record).await.unwrap();

        let found = repo.find_token("abc123").await.unwrap().unwrap();
        assert_eq!(found.user_id, user.id);
        assert!(found.is_usable(Utc::now()));

        assert!(repo.revoke_token("abc123").await.unwrap());
        assert!(!repo.revoke_token("abc123").await.unwrap());

        let revoked = repo.find_token("abc123").await.unwrap().unwrap();
        assert!(!revoked.is_usable(Utc::now()));
        assert!(repo.find_token("missing").await.unwrap().is_none());
    }
}
