use crate::domain::splits::PercentageHistory;
use crate::errors::{ApiResult, ValidationError};
use crate::storage::traits::PercentageStorage;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use shared::{EmployeePercentageResponse, PercentageHistoryResponse, PercentageSetting, SetEmployeePercentageRequest};
use std::sync::Arc;
use tracing::info;

/// Fraction digits kept when a percentage is stored
const PERCENTAGE_SCALE: u32 = 4;

/// Effective-dated employee percentage settings
#[derive(Clone)]
pub struct SettingsService {
    storage: Arc<dyn PercentageStorage>,
    default_percentage: Decimal,
}

impl SettingsService {
    pub fn new(storage: Arc<dyn PercentageStorage>, default_percentage: Decimal) -> Self {
        Self {
            storage,
            default_percentage,
        }
    }

    pub async fn history(&self) -> ApiResult<PercentageHistory> {
        let settings = self.storage.list_settings().await?;
        Ok(PercentageHistory::with_default(settings, self.default_percentage))
    }

    pub async fn percentage_on(&self, date: NaiveDate) -> ApiResult<EmployeePercentageResponse> {
        let history = self.history().await?;
        Ok(response_for(&history, date))
    }

    pub async fn current_percentage(&self) -> ApiResult<EmployeePercentageResponse> {
        self.percentage_on(Local::now().date_naive()).await
    }

    pub async fn set_employee_percentage(
        &self,
        request: SetEmployeePercentageRequest,
    ) -> ApiResult<EmployeePercentageResponse> {
        if request.percentage < Decimal::ZERO || request.percentage > Decimal::ONE_HUNDRED {
            return Err(ValidationError::PercentageOutOfRange.into());
        }

        let setting = PercentageSetting {
            effective_date: request.start_date,
            employee_percentage: request.percentage.round_dp(PERCENTAGE_SCALE),
        };
        self.storage.store_setting(&setting).await?;
        info!(
            "Employee percentage set to {} from {}",
            setting.employee_percentage, setting.effective_date
        );

        Ok(EmployeePercentageResponse {
            percentage: setting.employee_percentage,
            admin_percentage: setting.admin_percentage(),
            effective_date: Some(setting.effective_date),
        })
    }

    /// Settings ordered by start date
    pub async fn list_history(&self) -> ApiResult<PercentageHistoryResponse> {
        let history = self.history().await?;
        Ok(PercentageHistoryResponse {
            history: history.entries().to_vec(),
        })
    }
}

fn response_for(history: &PercentageHistory, date: NaiveDate) -> EmployeePercentageResponse {
    let percentage = history.effective_percentage(date);
    EmployeePercentageResponse {
        percentage,
        admin_percentage: Decimal::ONE_HUNDRED - percentage,
        effective_date: history.setting_on(date).map(|s| s.effective_date),
    }
}
