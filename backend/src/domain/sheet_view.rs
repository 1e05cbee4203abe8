//! Read-side helpers over a legacy sheet: search, column restriction,
//! sorting, per-employee projection and per-worker totals.

use crate::domain::sheet::worker_entries;
use crate::domain::splits::{checked_total, split_amount, totals_by_worker, PercentageHistory, SplitOverflow, WorkerTotals};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{Cell, DetailKind, EmployeeSheetResponse, ProjectionTotal, SheetRow, Transaction, Worker};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Keep only `worker`'s column in every row
pub fn restrict_to_worker(rows: &[SheetRow], worker: Worker) -> Vec<SheetRow> {
    rows.iter()
        .map(|row| SheetRow {
            kind: row.kind,
            cells: row
                .cells
                .iter()
                .filter(|(w, _)| **w == worker)
                .map(|(w, c)| (*w, c.clone()))
                .collect(),
            ids: row.ids.iter().filter(|(w, _)| **w == worker).map(|(w, id)| (*w, *id)).collect(),
        })
        .collect()
}

/// Column restriction first, then a case-insensitive search across the tag
/// and every remaining cell. A blank search keeps every row.
pub fn filter_sheet(rows: &[SheetRow], search: Option<&str>, worker: Option<Worker>) -> Vec<SheetRow> {
    let visible = match worker {
        Some(worker) => restrict_to_worker(rows, worker),
        None => rows.to_vec(),
    };

    let term = match search.map(str::trim) {
        Some(term) if !term.is_empty() => term.to_lowercase(),
        _ => return visible,
    };

    visible
        .into_iter()
        .filter(|row| {
            row.kind.is_some_and(|k| k.label().to_lowercase().contains(&term))
                || row
                    .cells
                    .values()
                    .any(|cell| cell.as_text().to_lowercase().contains(&term))
        })
        .collect()
}

/// Stable sort on one worker column. Two numbers compare numerically,
/// anything else compares as lowercase text with missing cells as "".
pub fn sort_sheet(rows: &[SheetRow], worker: Worker, direction: SortDirection) -> Vec<SheetRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_cells(a.cells.get(&worker), b.cells.get(&worker));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

fn compare_cells(a: Option<&Cell>, b: Option<&Cell>) -> Ordering {
    match (a, b) {
        (Some(Cell::Number(x)), Some(Cell::Number(y))) => x.cmp(y),
        _ => {
            let text = |c: Option<&Cell>| c.map(|c| c.as_text().to_lowercase()).unwrap_or_default();
            text(a).cmp(&text(b))
        }
    }
}

/// One worker's services as read from the sheet `rows` built from
/// `transactions`, closed by a total line.
///
/// Each transaction is split at the rate in force on its own date, the same
/// way the stats and chart views split it. The label lists the rates applied,
/// oldest first.
pub fn employee_projection(
    rows: &[SheetRow],
    worker: Worker,
    transactions: &[Transaction],
    history: &PercentageHistory,
) -> Result<EmployeeSheetResponse, SplitOverflow> {
    let entries = worker_entries(rows, worker);

    let total = if entries.is_empty() {
        None
    } else {
        let own: Vec<Transaction> = transactions.iter().filter(|t| t.worker == worker).cloned().collect();
        let totals = totals_by_worker(&own, history)?;
        let worker_totals = totals.get(&worker).copied().unwrap_or_default();

        Some(ProjectionTotal {
            label: projection_label(worker, &own, history),
            earnings: worker_totals.total,
            employee_share: worker_totals.employee_share.round_dp(2),
        })
    };

    Ok(EmployeeSheetResponse {
        worker,
        entries,
        total,
    })
}

/// "Total HENGI (50%)", or "Total HENGI (50%, 80%)" across a rate change
fn projection_label(worker: Worker, own: &[Transaction], history: &PercentageHistory) -> String {
    let mut dates: Vec<_> = own.iter().map(|t| t.date).collect();
    dates.sort();

    let mut rates: Vec<Decimal> = Vec::new();
    for date in dates {
        let rate = history.effective_percentage(date).normalize();
        if !rates.contains(&rate) {
            rates.push(rate);
        }
    }

    let rates: Vec<String> = rates.iter().map(|r| format!("{}%", r)).collect();
    format!("Total {} ({})", worker, rates.join(", "))
}

/// Per-worker totals of a sheet.
///
/// Hand-kept sheets close with a TOTAL row, which is trusted when present.
/// Otherwise the GANANCIA rows are summed.
pub fn sheet_totals(rows: &[SheetRow], percentage: Decimal) -> Result<BTreeMap<Worker, WorkerTotals>, SplitOverflow> {
    let earnings_of = |row: &SheetRow, worker: Worker| {
        row.value(worker).map(Cell::to_decimal).unwrap_or(Decimal::ZERO)
    };

    let total_row = rows.iter().find(|row| row.is(DetailKind::Total));

    Worker::ALL
        .into_iter()
        .map(|worker| -> Result<(Worker, WorkerTotals), SplitOverflow> {
            let earnings = match total_row {
                Some(row) => earnings_of(row, worker),
                None => checked_total(
                    rows.iter()
                        .filter(|row| row.is(DetailKind::Ganancia))
                        .map(|row| earnings_of(row, worker)),
                )?,
            };
            let mut totals = WorkerTotals::default();
            totals.add(earnings, split_amount(earnings, percentage)?)?;
            Ok((worker, totals))
        })
        .collect()
}
