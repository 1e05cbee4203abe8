use crate::domain::models::NewTransaction;
use crate::storage::connection::DbConnection;
use crate::storage::traits::TransactionStorage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{Transaction, Worker};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str =
    "SELECT id, worker, service_name, client, time, earnings, comment, date FROM transactions";

#[derive(Clone)]
pub struct TransactionRepository {
    db: DbConnection,
}

impl TransactionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Map a stored row, or `None` with a warning when it no longer fits the
    /// typed model (for example a worker that left the roster)
    fn row_to_transaction(row: &SqliteRow) -> Option<Transaction> {
        match Self::try_row_to_transaction(row) {
            Ok(transaction) => Some(transaction),
            Err(e) => {
                let id: i64 = row.get("id");
                warn!("Skipping stored transaction {}: {}", id, e);
                None
            }
        }
    }

    fn try_row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let worker_label: String = row.get("worker");
        let worker = Worker::parse(&worker_label)
            .ok_or_else(|| anyhow!("unknown worker {:?}", worker_label))?;

        let earnings_text: String = row.get("earnings");
        let earnings = earnings_text
            .parse::<Decimal>()
            .map_err(|e| anyhow!("bad earnings {:?}: {}", earnings_text, e))?;

        let date_text: String = row.get("date");
        let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT)
            .map_err(|e| anyhow!("bad date {:?}: {}", date_text, e))?;

        Ok(Transaction {
            id: row.get("id"),
            worker,
            service_name: row.get("service_name"),
            client: row.get("client"),
            time: row.get("time"),
            earnings,
            comment: row.get("comment"),
            date,
        })
    }
}

#[async_trait]
impl TransactionStorage for TransactionRepository {
    async fn store_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (worker, service_name, client, time, earnings, comment, date, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(transaction.worker.as_str())
        .bind(transaction.service_name.clone())
        .bind(transaction.client.clone())
        .bind(transaction.time.clone())
        .bind(transaction.earnings.to_string())
        .bind(transaction.date.format(DATE_FORMAT).to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(Transaction {
            id: result.last_insert_rowid(),
            worker: transaction.worker,
            service_name: transaction.service_name.clone(),
            client: transaction.client.clone(),
            time: transaction.time.clone(),
            earnings: transaction.earnings,
            comment: None,
            date: transaction.date,
        })
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().and_then(Self::row_to_transaction))
    }

    async fn list_transactions(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>> {
        let start = start_date.map(|d| d.format(DATE_FORMAT).to_string());
        let end = end_date.map(|d| d.format(DATE_FORMAT).to_string());

        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2) ORDER BY date ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().filter_map(Self::row_to_transaction).collect())
    }

    async fn update_comment(&self, id: i64, comment: Option<&str>) -> Result<bool> {
        let result = sqlx::query("UPDATE transactions SET comment = ? WHERE id = ?")
            .bind(comment)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_transaction(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
