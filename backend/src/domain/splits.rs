//! Employee/admin split of service earnings.
//!
//! The employee share of a service depends on the percentage in force on the
//! service date. Percentages form an effective-dated history: each entry
//! applies from its start date until a later entry supersedes it. Before the
//! first entry the default rate applies.
//!
//! All arithmetic is done on [`Decimal`] and never rounded here, so the two
//! shares of a service always add back to its earnings exactly. Every
//! operation is checked: an amount outside `Decimal`'s range is reported as
//! [`SplitOverflow`] rather than aborting the request.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{PercentageSetting, Transaction, Worker};
use std::collections::BTreeMap;
use thiserror::Error;

/// Rate applied when no history entry is in force yet
pub const DEFAULT_EMPLOYEE_PERCENTAGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Effective-dated employee percentages, sorted by start date.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentageHistory {
    entries: Vec<PercentageSetting>,
    default_percentage: Decimal,
}

impl PercentageHistory {
    pub fn new(entries: Vec<PercentageSetting>) -> Self {
        Self::with_default(entries, DEFAULT_EMPLOYEE_PERCENTAGE)
    }

    pub fn with_default(mut entries: Vec<PercentageSetting>, default_percentage: Decimal) -> Self {
        // Stable sort: of two entries sharing a start date the later one wins
        entries.sort_by_key(|entry| entry.effective_date);
        Self {
            entries,
            default_percentage,
        }
    }

    pub fn entries(&self) -> &[PercentageSetting] {
        &self.entries
    }

    pub fn default_percentage(&self) -> Decimal {
        self.default_percentage
    }

    /// Entry in force on `date`, if any
    pub fn setting_on(&self, date: NaiveDate) -> Option<&PercentageSetting> {
        let in_force = self.entries.partition_point(|entry| entry.effective_date <= date);
        in_force.checked_sub(1).map(|idx| &self.entries[idx])
    }

    pub fn effective_percentage(&self, date: NaiveDate) -> Decimal {
        self.setting_on(date)
            .map(|entry| entry.employee_percentage)
            .unwrap_or(self.default_percentage)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Amount out of range while computing earnings split")]
pub struct SplitOverflow;

/// `a + b`, or [`SplitOverflow`]
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, SplitOverflow> {
    a.checked_add(b).ok_or(SplitOverflow)
}

/// Sum of every amount, or [`SplitOverflow`]
pub fn checked_total<I>(amounts: I) -> Result<Decimal, SplitOverflow>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, checked_sum)
}

/// Employee and admin shares of one amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub employee_share: Decimal,
    pub admin_share: Decimal,
}

/// Running sums for one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTotals {
    pub total: Decimal,
    pub employee_share: Decimal,
    pub admin_share: Decimal,
}

impl WorkerTotals {
    pub fn add(&mut self, earnings: Decimal, split: Split) -> Result<(), SplitOverflow> {
        self.total = checked_sum(self.total, earnings)?;
        self.employee_share = checked_sum(self.employee_share, split.employee_share)?;
        self.admin_share = checked_sum(self.admin_share, split.admin_share)?;
        Ok(())
    }
}

pub fn effective_percentage(date: NaiveDate, history: &PercentageHistory) -> Decimal {
    history.effective_percentage(date)
}

/// Split an amount at a fixed percentage. The admin share takes the remainder.
pub fn split_amount(earnings: Decimal, percentage: Decimal) -> Result<Split, SplitOverflow> {
    let employee_share = earnings
        .checked_mul(percentage)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(SplitOverflow)?;
    let admin_share = earnings.checked_sub(employee_share).ok_or(SplitOverflow)?;

    Ok(Split {
        employee_share,
        admin_share,
    })
}

pub fn split_transaction(transaction: &Transaction, history: &PercentageHistory) -> Result<Split, SplitOverflow> {
    split_amount(
        transaction.earnings,
        history.effective_percentage(transaction.date),
    )
}

/// Per-worker sums. Every worker is present, idle ones with zeros.
pub fn totals_by_worker(
    transactions: &[Transaction],
    history: &PercentageHistory,
) -> Result<BTreeMap<Worker, WorkerTotals>, SplitOverflow> {
    let mut totals: BTreeMap<Worker, WorkerTotals> = Worker::ALL
        .into_iter()
        .map(|worker| (worker, WorkerTotals::default()))
        .collect();

    for txn in transactions {
        totals
            .entry(txn.worker)
            .or_default()
            .add(txn.earnings, split_transaction(txn, history)?)?;
    }

    Ok(totals)
}

pub fn admin_grand_total(totals: &BTreeMap<Worker, WorkerTotals>) -> Result<Decimal, SplitOverflow> {
    checked_total(totals.values().map(|t| t.admin_share))
}
