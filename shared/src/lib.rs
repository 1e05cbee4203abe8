use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the fixed worker columns of the ledger.
///
/// Labels are accepted in any case on input and always rendered uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Worker {
    Hengi,
    Marleni,
    Israel,
    Thaicar,
}

impl Worker {
    /// Every worker, in column order
    pub const ALL: [Worker; 4] = [Worker::Hengi, Worker::Marleni, Worker::Israel, Worker::Thaicar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Worker::Hengi => "HENGI",
            Worker::Marleni => "MARLENI",
            Worker::Israel => "ISRAEL",
            Worker::Thaicar => "THAICAR",
        }
    }

    /// Normalize a free-form label to a worker, `None` when it is not one of ours
    pub fn parse(label: &str) -> Option<Worker> {
        let canonical = label.trim().to_uppercase();
        Worker::ALL.into_iter().find(|w| w.as_str() == canonical)
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownWorkerError(pub String);

impl fmt::Display for UnknownWorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown worker: {}", self.0)
    }
}

impl std::error::Error for UnknownWorkerError {}

impl FromStr for Worker {
    type Err = UnknownWorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Worker::parse(s).ok_or_else(|| UnknownWorkerError(s.to_string()))
    }
}

impl TryFrom<String> for Worker {
    type Error = UnknownWorkerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Worker> for String {
    fn from(worker: Worker) -> Self {
        worker.as_str().to_string()
    }
}

/// A single service performed by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Store-assigned identifier, never reused
    pub id: i64,
    pub worker: Worker,
    /// Free text, usually one of the catalog entries
    pub service_name: String,
    pub client: Option<String>,
    /// Time-of-day label as typed at the counter, not a timestamp
    pub time: Option<String>,
    /// Gross value of the service
    pub earnings: Decimal,
    pub comment: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListRequest {
    /// Inclusive lower bound
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Worker label, any case
    pub worker: String,
    pub service_name: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    pub earnings: Decimal,
    /// Defaults to today when omitted
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: String,
}

/// One dated entry of the employee percentage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageSetting {
    pub effective_date: NaiveDate,
    pub employee_percentage: Decimal,
}

impl PercentageSetting {
    pub fn admin_percentage(&self) -> Decimal {
        Decimal::ONE_HUNDRED - self.employee_percentage
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePercentageResponse {
    pub percentage: Decimal,
    pub admin_percentage: Decimal,
    /// Start date of the setting in force, `None` when running on the default
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEmployeePercentageRequest {
    pub percentage: Decimal,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentageHistoryResponse {
    pub history: Vec<PercentageSetting>,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub role: Role,
    /// Column this user reads from, employees only
    pub worker: Option<Worker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// JWT claims carried by every access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub worker: Option<Worker>,
    pub exp: usize,
    pub iat: usize,
}

/// Body of every non-2xx JSON response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Legacy sheet layout
// ---------------------------------------------------------------------------

/// Row tag of the legacy sheet ("DETALLE" column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetailKind {
    #[serde(rename = "SERVICIO")]
    Servicio,
    #[serde(rename = "CLIENTE")]
    Cliente,
    #[serde(rename = "HORA")]
    Hora,
    #[serde(rename = "GANANCIA")]
    Ganancia,
    #[serde(rename = "NOTA")]
    Nota,
    /// Per-worker totals row found at the bottom of hand-kept sheets
    #[serde(rename = "TOTAL")]
    Total,
    /// Per-worker percentage row, e.g. "50.%"
    #[serde(rename = "%")]
    Percent,
}

impl DetailKind {
    /// Order in which one batch of rows is laid out
    pub const BATCH: [DetailKind; 5] = [
        DetailKind::Servicio,
        DetailKind::Cliente,
        DetailKind::Hora,
        DetailKind::Ganancia,
        DetailKind::Nota,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DetailKind::Servicio => "SERVICIO",
            DetailKind::Cliente => "CLIENTE",
            DetailKind::Hora => "HORA",
            DetailKind::Ganancia => "GANANCIA",
            DetailKind::Nota => "NOTA",
            DetailKind::Total => "TOTAL",
            DetailKind::Percent => "%",
        }
    }

    pub fn from_label(label: &str) -> Option<DetailKind> {
        match label.trim().to_uppercase().as_str() {
            "SERVICIO" => Some(DetailKind::Servicio),
            "CLIENTE" => Some(DetailKind::Cliente),
            "HORA" => Some(DetailKind::Hora),
            "GANANCIA" => Some(DetailKind::Ganancia),
            "NOTA" => Some(DetailKind::Nota),
            "TOTAL" => Some(DetailKind::Total),
            "%" => Some(DetailKind::Percent),
            _ => None,
        }
    }
}

/// Content of one worker column in a sheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Text(String),
}

impl Cell {
    /// Empty text and missing cells are treated alike by every reader
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.normalize().to_string(),
        }
    }

    /// Numeric reading of the cell; anything unparsable reads as zero
    pub fn to_decimal(&self) -> Decimal {
        match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Number(value)
    }
}

/// One row of the legacy grid: a tag plus one cell per worker column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    /// `None` for rows whose tag is missing or unrecognised; they still occupy a position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DetailKind>,
    #[serde(default)]
    pub cells: BTreeMap<Worker, Cell>,
    /// Transaction ids per worker, only ever set on SERVICIO rows
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ids: BTreeMap<Worker, i64>,
}

impl SheetRow {
    pub fn new(kind: DetailKind) -> Self {
        Self {
            kind: Some(kind),
            cells: BTreeMap::new(),
            ids: BTreeMap::new(),
        }
    }

    pub fn untagged() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, worker: Worker, cell: impl Into<Cell>) -> Self {
        self.cells.insert(worker, cell.into());
        self
    }

    pub fn with_id(mut self, worker: Worker, id: i64) -> Self {
        self.ids.insert(worker, id);
        self
    }

    pub fn is(&self, kind: DetailKind) -> bool {
        self.kind == Some(kind)
    }

    /// The worker's cell when present and non-empty
    pub fn value(&self, worker: Worker) -> Option<&Cell> {
        self.cells.get(&worker).filter(|cell| !cell.is_empty())
    }
}

/// A service reconstructed from the sheet for one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEntry {
    pub service: String,
    pub earnings: Decimal,
    pub client: String,
    pub time: String,
    pub comment: String,
    pub id: Option<i64>,
}

pub type GroupedEntries = BTreeMap<Worker, Vec<WorkerEntry>>;

// ---------------------------------------------------------------------------
// Dashboard responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerTotalsDto {
    pub worker: Worker,
    pub total: Decimal,
    pub employee_share: Decimal,
    pub admin_share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub workers: Vec<WorkerTotalsDto>,
    pub admin_total: Decimal,
    pub current_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub totals: WorkerTotalsDto,
    pub service_count: usize,
    pub current_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTableResponse {
    pub entries: GroupedEntries,
    pub totals: Vec<WorkerTotalsDto>,
    pub admin_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSplit {
    pub employee: Decimal,
    pub admin: Decimal,
}

/// Earnings of one calendar day, split per worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySplit {
    /// Short display label, e.g. "15 feb"
    pub name: String,
    pub date: NaiveDate,
    pub workers: BTreeMap<Worker, ShareSplit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFrequency {
    /// Shortened label for chart axes
    pub name: String,
    pub full_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDistribution {
    pub worker: Worker,
    pub total: Decimal,
    pub employee: Decimal,
    pub admin: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartsResponse {
    pub timeline: Vec<DailySplit>,
    pub frequency: Vec<ServiceFrequency>,
    pub distribution: Vec<WorkerDistribution>,
    pub admin_total: Decimal,
}

/// Closing line of an employee's sheet view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionTotal {
    /// e.g. "Total HENGI (50%)"
    pub label: String,
    pub earnings: Decimal,
    pub employee_share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSheetResponse {
    pub worker: Worker,
    pub entries: Vec<WorkerEntry>,
    /// Absent when the worker has no entries
    pub total: Option<ProjectionTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSheetRequest {
    pub url: String,
    /// Restrict the result to one worker column
    #[serde(default)]
    pub worker: Option<Worker>,
    /// Case-insensitive search over every cell
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSheetResponse {
    pub row_count: usize,
    pub entries: GroupedEntries,
    pub totals: Vec<WorkerTotalsDto>,
    pub admin_total: Decimal,
}
