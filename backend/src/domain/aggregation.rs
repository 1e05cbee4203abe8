//! Filtering and grouping of transactions for the chart and summary views.

use crate::domain::splits::{checked_sum, checked_total, split_transaction, PercentageHistory, SplitOverflow, WorkerTotals};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{DailySplit, ServiceFrequency, ShareSplit, Transaction, Worker, WorkerDistribution};
use std::collections::{BTreeMap, HashMap};

const SHORT_NAME_PREFIX: &str = "SERVICIO ";
const SHORT_NAME_MAX_CHARS: usize = 15;
const SPANISH_SHORT_MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Date window applied before any aggregation. Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    On(NaiveDate),
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DateFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::On(day) => date == *day,
            DateFilter::Range { start, end } => {
                start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
            }
        }
    }
}

/// Query-string form of [`DateFilter`]: `filter=all|specific|range` plus dates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilterQuery {
    pub filter: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateFilterQuery {
    /// A "specific" filter without a date keeps everything, like "all".
    pub fn to_filter(&self) -> Result<DateFilter, String> {
        match self.filter.as_deref().unwrap_or("all") {
            "all" => Ok(DateFilter::All),
            "specific" => Ok(self.date.map(DateFilter::On).unwrap_or(DateFilter::All)),
            "range" => Ok(DateFilter::Range {
                start: self.start_date,
                end: self.end_date,
            }),
            other => Err(format!("Unknown date filter: {}", other)),
        }
    }
}

pub fn filter_by_date(transactions: &[Transaction], filter: &DateFilter) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| filter.contains(t.date))
        .cloned()
        .collect()
}

/// Short Spanish day label, e.g. "15 feb"
pub fn short_date_label(date: NaiveDate) -> String {
    format!("{} {}", date.day(), SPANISH_SHORT_MONTHS[date.month0() as usize])
}

/// One record per distinct date, oldest first, with the employee/admin
/// split of every worker active that day.
pub fn group_by_date_and_worker(
    transactions: &[Transaction],
    history: &PercentageHistory,
) -> Result<Vec<DailySplit>, SplitOverflow> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<Worker, ShareSplit>> = BTreeMap::new();

    for txn in transactions {
        let split = split_transaction(txn, history)?;
        let share = by_date
            .entry(txn.date)
            .or_default()
            .entry(txn.worker)
            .or_insert(ShareSplit {
                employee: Decimal::ZERO,
                admin: Decimal::ZERO,
            });
        share.employee = checked_sum(share.employee, split.employee_share)?;
        share.admin = checked_sum(share.admin, split.admin_share)?;
    }

    Ok(by_date
        .into_iter()
        .map(|(date, workers)| DailySplit {
            name: short_date_label(date),
            date,
            workers,
        })
        .collect())
}

/// Axis label for a service: drop the common prefix and cap the length.
pub fn short_service_name(name: &str) -> String {
    let short = name.strip_prefix(SHORT_NAME_PREFIX).unwrap_or(name);
    if short.chars().count() > SHORT_NAME_MAX_CHARS {
        let truncated: String = short.chars().take(SHORT_NAME_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        short.to_string()
    }
}

/// Count services by name.
///
/// With `show_all` every catalog entry is listed first, in catalog order,
/// even at zero; names outside the catalog follow in first-seen order.
/// Without it only services that occur are listed, in first-seen order.
pub fn service_frequency(
    transactions: &[Transaction],
    catalog: &[&str],
    show_all: bool,
) -> Vec<ServiceFrequency> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    if show_all {
        for name in catalog {
            if counts.insert(name.to_string(), 0).is_none() {
                order.push(name.to_string());
            }
        }
    }

    for txn in transactions {
        let count = counts.entry(txn.service_name.clone()).or_insert_with(|| {
            order.push(txn.service_name.clone());
            0
        });
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|name| {
            let count = counts.get(&name).copied().unwrap_or(0);
            (show_all || count > 0).then(|| ServiceFrequency {
                name: short_service_name(&name),
                full_name: name,
                count,
            })
        })
        .collect()
}

/// Per-worker totals of the workers present in `transactions`
pub fn distribution_by_worker(
    transactions: &[Transaction],
    history: &PercentageHistory,
) -> Result<Vec<WorkerDistribution>, SplitOverflow> {
    let mut totals: BTreeMap<Worker, WorkerTotals> = BTreeMap::new();
    for txn in transactions {
        totals
            .entry(txn.worker)
            .or_default()
            .add(txn.earnings, split_transaction(txn, history)?)?;
    }

    Ok(totals
        .into_iter()
        .map(|(worker, t)| WorkerDistribution {
            worker,
            total: t.total,
            employee: t.employee_share,
            admin: t.admin_share,
        })
        .collect())
}

pub fn distribution_admin_total(distribution: &[WorkerDistribution]) -> Result<Decimal, SplitOverflow> {
    checked_total(distribution.iter().map(|d| d.admin))
}
