use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

/// Shared handle to the SQLite pool backing every repository
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and make sure the schema exists
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database {}", url);
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Fresh in-memory database, private to the caller
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().simple().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // Ids come from AUTOINCREMENT so a deleted id is never handed out again
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                worker TEXT NOT NULL,
                service_name TEXT NOT NULL,
                client TEXT,
                time TEXT,
                earnings TEXT NOT NULL,
                comment TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date);")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS percentage_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                effective_date TEXT NOT NULL,
                employee_percentage TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                worker TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                expires_at TEXT NOT NULL,
                revoked INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_schema_is_created() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .expect("Failed to list tables");
        let tables: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

        for table in ["percentage_settings", "refresh_tokens", "transactions", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_every_pooled_connection_sees_the_schema() {
        let db = DbConnection::init_test().await.unwrap();

        // Hold several connections at once so the pool must open new ones
        let mut connections = Vec::new();
        for _ in 0..3 {
            connections.push(db.pool().acquire().await.unwrap());
        }

        for conn in connections.iter_mut() {
            let row = sqlx::query("SELECT COUNT(*) AS count FROM transactions")
                .fetch_one(&mut **conn)
                .await
                .expect("schema missing on pooled connection");
            assert_eq!(row.get::<i64, _>("count"), 0);
        }
    }

    #[tokio::test]
    async fn test_test_databases_are_isolated() {
        let first = DbConnection::init_test().await.unwrap();
        let second = DbConnection::init_test().await.unwrap();

        sqlx::query("INSERT INTO users (username, password_hash, role) VALUES ('admin', 'x', 'admin')")
            .execute(first.pool())
            .await
            .unwrap();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(second.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 0);
    }
}
