//! # Spreadsheet Import
//!
//! Loads a hand-kept `.xlsx` ledger from a URL and turns its first worksheet
//! into [`SheetRow`]s for the positional reconstructor.
//!
//! ## Key Responsibilities
//! - Fetch the workbook bytes through a [`SpreadsheetSource`] (HTTP in production)
//! - Locate the header row (the one carrying a `DETALLE` column) and the worker columns
//! - Convert every following non-blank row into a tagged or untagged [`SheetRow`]
//! - Keep parsed sheets in an [`ImportCache`] for a fixed time-to-live
//!
//! The cache expires entries purely by age. It reads time from an injected
//! [`Clock`] so expiry can be driven by hand in tests.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use shared::{Cell, DetailKind, SheetRow, Worker};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const DETAIL_HEADER: &str = "DETALLE";

/// Default lifetime of a cached sheet
pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Where workbook bytes come from
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches workbooks over HTTP(S)
#[derive(Clone, Default)]
pub struct HttpSpreadsheetSource {
    client: reqwest::Client,
}

impl HttpSpreadsheetSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpreadsheetSource for HttpSpreadsheetSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch spreadsheet from {}", url))?
            .error_for_status()
            .with_context(|| format!("Spreadsheet request to {} was rejected", url))?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

struct CachedSheet {
    rows: Arc<Vec<SheetRow>>,
    fetched_at: DateTime<Utc>,
}

/// Parsed sheets keyed by URL, valid for `ttl` after they were fetched
pub struct ImportCache<C: Clock = SystemClock> {
    clock: C,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedSheet>>,
}

impl<C: Clock> ImportCache<C> {
    pub fn new(clock: C, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached rows for `url` while younger than the TTL
    pub async fn get(&self, url: &str) -> Option<Arc<Vec<SheetRow>>> {
        let entries = self.entries.lock().await;
        let cached = entries.get(url)?;
        let age = self.clock.now() - cached.fetched_at;
        (age < self.ttl).then(|| cached.rows.clone())
    }

    pub async fn insert(&self, url: &str, rows: Vec<SheetRow>) -> Arc<Vec<SheetRow>> {
        let rows = Arc::new(rows);
        let mut entries = self.entries.lock().await;
        entries.insert(
            url.to_string(),
            CachedSheet {
                rows: rows.clone(),
                fetched_at: self.clock.now(),
            },
        );
        rows
    }
}

/// Fetch, parse and cache spreadsheets
pub struct SheetImporter<C: Clock = SystemClock> {
    source: Arc<dyn SpreadsheetSource>,
    cache: ImportCache<C>,
}

impl<C: Clock> SheetImporter<C> {
    pub fn new(source: Arc<dyn SpreadsheetSource>, cache: ImportCache<C>) -> Self {
        Self { source, cache }
    }

    pub async fn load(&self, url: &str) -> Result<Arc<Vec<SheetRow>>> {
        if let Some(rows) = self.cache.get(url).await {
            debug!("Serving spreadsheet {} from cache", url);
            return Ok(rows);
        }

        info!("Fetching spreadsheet {}", url);
        let bytes = self.source.fetch(url).await?;
        let rows = parse_workbook(&bytes)?;
        info!("Parsed {} rows from {}", rows.len(), url);

        Ok(self.cache.insert(url, rows).await)
    }
}

/// Parse the first worksheet of an `.xlsx` workbook.
///
/// Rows above the header are ignored. Blank rows are dropped; rows whose
/// DETALLE cell is not a known tag are kept untagged so later rows keep
/// their relative positions.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| anyhow!("Failed to open workbook: {}", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no worksheets"))?
        .map_err(|e| anyhow!("Failed to read first worksheet: {}", e))?;

    let mut rows_iter = range.rows();

    let layout = rows_iter
        .by_ref()
        .find_map(ColumnLayout::from_header)
        .ok_or_else(|| anyhow!("No {} header found in worksheet", DETAIL_HEADER))?;

    if layout.workers.is_empty() {
        warn!("Spreadsheet header has no worker columns");
    }

    let rows = rows_iter
        .filter(|row| row.iter().any(|c| !is_blank(c)))
        .map(|row| layout.read_row(row))
        .collect();

    Ok(rows)
}

struct ColumnLayout {
    detail: usize,
    workers: Vec<(Worker, usize)>,
}

impl ColumnLayout {
    fn from_header(row: &[Data]) -> Option<Self> {
        let detail = row
            .iter()
            .position(|cell| header_text(cell).is_some_and(|t| t == DETAIL_HEADER))?;

        let workers = row
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| {
                let label = header_text(cell)?;
                Worker::parse(&label).map(|worker| (worker, idx))
            })
            .collect();

        Some(Self { detail, workers })
    }

    fn read_row(&self, row: &[Data]) -> SheetRow {
        let kind = row
            .get(self.detail)
            .and_then(header_text)
            .and_then(|label| DetailKind::from_label(&label));

        let mut sheet_row = SheetRow {
            kind,
            ..SheetRow::default()
        };
        for (worker, idx) in &self.workers {
            if let Some(cell) = row.get(*idx).and_then(to_cell) {
                sheet_row.cells.insert(*worker, cell);
            }
        }
        sheet_row
    }
}

fn header_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.trim().to_uppercase()),
        _ => None,
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn to_cell(cell: &Data) -> Option<Cell> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Cell::Number(Decimal::from(*i))),
        Data::Float(f) => Some(
            Decimal::try_from(*f)
                .map(Cell::Number)
                .unwrap_or_else(|_| Cell::Text(f.to_string())),
        ),
        Data::String(s) => Some(Cell::Text(s.clone())),
        Data::Bool(b) => Some(Cell::Text(b.to_string())),
        other => Some(Cell::Text(other.to_string())),
    }
}
