use crate::storage::connection::DbConnection;
use crate::storage::traits::PercentageStorage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::PercentageSetting;
use sqlx::Row;

#[derive(Clone)]
pub struct PercentageRepository {
    db: DbConnection,
}

impl PercentageRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PercentageStorage for PercentageRepository {
    async fn store_setting(&self, setting: &PercentageSetting) -> Result<()> {
        sqlx::query(
            "INSERT INTO percentage_settings (effective_date, employee_percentage, created_at) VALUES (?, ?, ?)",
        )
        .bind(setting.effective_date.format("%Y-%m-%d").to_string())
        .bind(setting.employee_percentage.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<PercentageSetting>> {
        let rows = sqlx::query(
            "SELECT effective_date, employee_percentage FROM percentage_settings ORDER BY id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let date: String = row.get("effective_date");
                let pct: String = row.get("employee_percentage");
                Ok(PercentageSetting {
                    effective_date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                        .map_err(|e| anyhow!("Corrupt effective date {:?}: {}", date, e))?,
                    employee_percentage: pct
                        .parse::<Decimal>()
                        .map_err(|e| anyhow!("Corrupt percentage {:?}: {}", pct, e))?,
                })
            })
            .collect()
    }
}
