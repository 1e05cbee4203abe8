//! Positional reconstruction between service transactions and the legacy sheet layout.
//!
//! The legacy grid keeps one column per worker and one row per detail kind.
//! Every service occupies a batch of five rows (SERVICIO, CLIENTE, HORA,
//! GANANCIA, NOTA) and the n-th batch holds the n-th service of every worker.
//!
//! - [`transactions_to_sheet`] lays transactions out in that grid.
//! - [`sheet_to_entries`] walks a grid back into per-worker entries by probing
//!   the rows around each SERVICIO row. It accepts hand-edited grids whose rows
//!   are not batch-aligned, so the probing order decides attribution.

use rust_decimal::Decimal;
use shared::{Cell, DetailKind, GroupedEntries, SheetRow, Transaction, Worker, WorkerEntry};
use std::collections::BTreeMap;
use tracing::debug;

/// Offsets searched for the auxiliary fields of a service row, rows below first.
///
/// A batch carries four auxiliary rows after its SERVICIO row, so the forward
/// window spans four rows before falling back to the rows above.
pub const FIELD_SEARCH_OFFSETS: [isize; 7] = [1, 2, 3, 4, -1, -2, -3];

/// Offsets searched for a service id when the row itself carries none, rows above first.
pub const ID_SEARCH_OFFSETS: [isize; 7] = [-3, -2, -1, 0, 1, 2, 3];

/// Lay transactions out as batches of five rows, one batch per slot index.
///
/// Each worker keeps the relative order of its own transactions. Slot `i` of
/// the output holds the `i`-th transaction of every worker that has one.
pub fn transactions_to_sheet(transactions: &[Transaction]) -> Vec<SheetRow> {
    let partitions = partition_by_worker(transactions);
    let max_count = partitions.values().map(Vec::len).max().unwrap_or(0);

    let mut rows = Vec::with_capacity(max_count * DetailKind::BATCH.len());
    for slot in 0..max_count {
        let [mut service, mut client, mut time, mut earnings, mut note] =
            DetailKind::BATCH.map(SheetRow::new);

        for (worker, worker_transactions) in &partitions {
            let Some(txn) = worker_transactions.get(slot) else {
                continue;
            };
            service
                .cells
                .insert(*worker, Cell::Text(txn.service_name.clone()));
            service.ids.insert(*worker, txn.id);
            client
                .cells
                .insert(*worker, Cell::Text(txn.client.clone().unwrap_or_default()));
            time.cells
                .insert(*worker, Cell::Text(txn.time.clone().unwrap_or_default()));
            earnings.cells.insert(*worker, Cell::Number(txn.earnings));
            note.cells
                .insert(*worker, Cell::Text(txn.comment.clone().unwrap_or_default()));
        }

        rows.extend([service, client, time, earnings, note]);
    }

    debug!(
        "Laid out {} transactions as {} sheet rows",
        transactions.len(),
        rows.len()
    );
    rows
}

fn partition_by_worker(transactions: &[Transaction]) -> BTreeMap<Worker, Vec<&Transaction>> {
    let mut partitions: BTreeMap<Worker, Vec<&Transaction>> = BTreeMap::new();
    for txn in transactions {
        partitions.entry(txn.worker).or_default().push(txn);
    }
    partitions
}

/// Rebuild per-worker service entries from a sheet.
///
/// Every worker appears in the result, possibly with no entries. Rows that are
/// not SERVICIO rows never start an entry, and untagged rows only matter as
/// positions for the probing.
pub fn sheet_to_entries(rows: &[SheetRow]) -> GroupedEntries {
    let mut grouped: GroupedEntries = Worker::ALL.into_iter().map(|w| (w, Vec::new())).collect();

    for (idx, row) in rows.iter().enumerate() {
        match row.kind {
            Some(DetailKind::Servicio) => {}
            None => {
                debug!("Skipping untagged sheet row {}", idx);
                continue;
            }
            Some(_) => continue,
        }

        for worker in Worker::ALL {
            let Some(service) = row.value(worker) else {
                continue;
            };

            let entry = WorkerEntry {
                service: service.as_text(),
                earnings: find_detail_value(rows, idx, DetailKind::Ganancia, worker)
                    .map(Cell::to_decimal)
                    .unwrap_or(Decimal::ZERO),
                client: text_or_empty(find_detail_value(rows, idx, DetailKind::Cliente, worker)),
                time: text_or_empty(find_detail_value(rows, idx, DetailKind::Hora, worker)),
                comment: text_or_empty(find_detail_value(rows, idx, DetailKind::Nota, worker)),
                id: row
                    .ids
                    .get(&worker)
                    .copied()
                    .or_else(|| find_service_id(rows, idx, worker)),
            };

            grouped.entry(worker).or_default().push(entry);
        }
    }

    grouped
}

/// Entries of a single worker, in sheet order
pub fn worker_entries(rows: &[SheetRow], worker: Worker) -> Vec<WorkerEntry> {
    sheet_to_entries(rows).remove(&worker).unwrap_or_default()
}

/// The first row of `kind` around `idx` decides the value, even when its cell is empty.
pub fn find_detail_value(
    rows: &[SheetRow],
    idx: usize,
    kind: DetailKind,
    worker: Worker,
) -> Option<&Cell> {
    FIELD_SEARCH_OFFSETS
        .iter()
        .filter_map(|offset| row_at(rows, idx, *offset))
        .find(|candidate| candidate.is(kind))
        .and_then(|candidate| candidate.value(worker))
}

/// Id of the nearest SERVICIO row that has both a value and an id for `worker`.
pub fn find_service_id(rows: &[SheetRow], idx: usize, worker: Worker) -> Option<i64> {
    ID_SEARCH_OFFSETS
        .iter()
        .filter_map(|offset| row_at(rows, idx, *offset))
        .filter(|candidate| candidate.is(DetailKind::Servicio) && candidate.value(worker).is_some())
        .find_map(|candidate| candidate.ids.get(&worker).copied())
}

fn row_at(rows: &[SheetRow], idx: usize, offset: isize) -> Option<&SheetRow> {
    idx.checked_add_signed(offset).and_then(|i| rows.get(i))
}

fn text_or_empty(cell: Option<&Cell>) -> String {
    cell.map(Cell::as_text).unwrap_or_default()
}
