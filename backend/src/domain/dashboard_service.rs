//! # Dashboard Service
//!
//! Builds the read models behind the dashboard: the legacy sheet view, the
//! per-worker table, summary stats, chart series and spreadsheet imports.
//!
//! ## Key Responsibilities
//! - Lay live transactions out as a legacy sheet and read them back per worker
//! - Apply the effective-dated percentage split to every total
//! - Round money to cents only when building responses
//! - Serve imported spreadsheets through the positional reconstructor

use crate::domain::aggregation::{
    distribution_admin_total, distribution_by_worker, filter_by_date, group_by_date_and_worker,
    service_frequency, DateFilter,
};
use crate::domain::catalog::SERVICE_CATALOG;
use crate::domain::settings_service::SettingsService;
use crate::domain::sheet::{sheet_to_entries, transactions_to_sheet};
use crate::domain::sheet_import::SheetImporter;
use crate::domain::sheet_view::{employee_projection, filter_sheet, sheet_totals, sort_sheet, SortDirection};
use crate::domain::splits::{admin_grand_total, totals_by_worker, WorkerTotals};
use crate::domain::transaction_service::TransactionService;
use crate::errors::ApiResult;
use rust_decimal::Decimal;
use shared::{
    AdminStatsResponse, AdminTableResponse, ChartsResponse, DailySplit, EmployeeSheetResponse,
    ImportSheetRequest, ImportSheetResponse, SheetRow, ShareSplit, TransactionListRequest,
    UserStatsResponse, Worker, WorkerDistribution, WorkerTotalsDto,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Options of the sheet view
#[derive(Debug, Clone, Default)]
pub struct SheetOptions {
    pub range: TransactionListRequest,
    pub search: Option<String>,
    pub worker: Option<Worker>,
    pub sort_by: Option<Worker>,
    pub direction: SortDirection,
}

#[derive(Clone)]
pub struct DashboardService {
    transactions: TransactionService,
    settings: SettingsService,
    importer: Arc<SheetImporter>,
}

impl DashboardService {
    pub fn new(transactions: TransactionService, settings: SettingsService, importer: Arc<SheetImporter>) -> Self {
        Self {
            transactions,
            settings,
            importer,
        }
    }

    pub async fn admin_stats(&self) -> ApiResult<AdminStatsResponse> {
        let transactions = self
            .transactions
            .list_transactions(&TransactionListRequest::default(), None)
            .await?;
        let history = self.settings.history().await?;
        let totals = totals_by_worker(&transactions, &history)?;
        let current = self.settings.current_percentage().await?;

        Ok(AdminStatsResponse {
            admin_total: money(admin_grand_total(&totals)?),
            workers: totals_dto(&totals),
            current_percentage: current.percentage,
        })
    }

    pub async fn user_stats(&self, worker: Worker) -> ApiResult<UserStatsResponse> {
        let transactions = self
            .transactions
            .list_transactions(&TransactionListRequest::default(), Some(worker))
            .await?;
        let history = self.settings.history().await?;
        let totals = totals_by_worker(&transactions, &history)?;
        let current = self.settings.current_percentage().await?;

        Ok(UserStatsResponse {
            totals: worker_totals_dto(worker, &totals.get(&worker).copied().unwrap_or_default()),
            service_count: transactions.len(),
            current_percentage: current.percentage,
        })
    }

    /// Live transactions laid out as the legacy sheet
    pub async fn sheet(&self, options: &SheetOptions) -> ApiResult<Vec<SheetRow>> {
        let transactions = self.transactions.list_transactions(&options.range, None).await?;
        let rows = transactions_to_sheet(&transactions);
        let rows = filter_sheet(&rows, options.search.as_deref(), options.worker);

        Ok(match options.sort_by {
            Some(column) => sort_sheet(&rows, column, options.direction),
            None => rows,
        })
    }

    /// One worker's view of the sheet, closed by a total split at the
    /// percentage in force on each service date
    pub async fn employee_sheet(&self, worker: Worker, range: &TransactionListRequest) -> ApiResult<EmployeeSheetResponse> {
        let transactions = self.transactions.list_transactions(range, Some(worker)).await?;
        let history = self.settings.history().await?;
        let rows = transactions_to_sheet(&transactions);
        Ok(employee_projection(&rows, worker, &transactions, &history)?)
    }

    /// Per-worker entries reconstructed from the sheet, plus totals
    pub async fn table(&self, range: &TransactionListRequest) -> ApiResult<AdminTableResponse> {
        let transactions = self.transactions.list_transactions(range, None).await?;
        let history = self.settings.history().await?;
        let totals = totals_by_worker(&transactions, &history)?;

        Ok(AdminTableResponse {
            entries: sheet_to_entries(&transactions_to_sheet(&transactions)),
            totals: totals_dto(&totals),
            admin_total: money(admin_grand_total(&totals)?),
        })
    }

    pub async fn charts(&self, filter: &DateFilter, show_all: bool, scope: Option<Worker>) -> ApiResult<ChartsResponse> {
        let transactions = self
            .transactions
            .list_transactions(&TransactionListRequest::default(), scope)
            .await?;
        let filtered = filter_by_date(&transactions, filter);
        let history = self.settings.history().await?;

        let distribution = distribution_by_worker(&filtered, &history)?;
        let admin_total = money(distribution_admin_total(&distribution)?);

        Ok(ChartsResponse {
            timeline: group_by_date_and_worker(&filtered, &history)?
                .into_iter()
                .map(round_daily)
                .collect(),
            frequency: service_frequency(&filtered, &SERVICE_CATALOG, show_all),
            distribution: distribution.into_iter().map(round_distribution).collect(),
            admin_total,
        })
    }

    /// Fetch (or reuse) a spreadsheet and reconstruct its entries
    pub async fn import_sheet(&self, request: &ImportSheetRequest) -> ApiResult<ImportSheetResponse> {
        let rows = self.importer.load(&request.url).await?;
        let visible = filter_sheet(&rows, request.search.as_deref(), request.worker);
        let current = self.settings.current_percentage().await?;
        let totals = sheet_totals(&visible, current.percentage)?;

        info!("Imported {} rows from {}", visible.len(), request.url);
        Ok(ImportSheetResponse {
            row_count: visible.len(),
            entries: sheet_to_entries(&visible),
            admin_total: money(admin_grand_total(&totals)?),
            totals: totals_dto(&totals),
        })
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

fn worker_totals_dto(worker: Worker, totals: &WorkerTotals) -> WorkerTotalsDto {
    WorkerTotalsDto {
        worker,
        total: money(totals.total),
        employee_share: money(totals.employee_share),
        admin_share: money(totals.admin_share),
    }
}

fn totals_dto(totals: &BTreeMap<Worker, WorkerTotals>) -> Vec<WorkerTotalsDto> {
    totals.iter().map(|(w, t)| worker_totals_dto(*w, t)).collect()
}

fn round_daily(day: DailySplit) -> DailySplit {
    DailySplit {
        workers: day
            .workers
            .into_iter()
            .map(|(w, s)| {
                (
                    w,
                    ShareSplit {
                        employee: money(s.employee),
                        admin: money(s.admin),
                    },
                )
            })
            .collect(),
        ..day
    }
}

fn round_distribution(d: WorkerDistribution) -> WorkerDistribution {
    WorkerDistribution {
        worker: d.worker,
        total: money(d.total),
        employee: money(d.employee),
        admin: money(d.admin),
    }
}
