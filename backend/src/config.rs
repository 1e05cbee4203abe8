use serde::Deserialize;
use shared::{Role, Worker};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SERVICE_LEDGER_CONFIG";
const DATABASE_URL_ENV: &str = "SERVICE_LEDGER_DATABASE_URL";
const BIND_ADDRESS_ENV: &str = "SERVICE_LEDGER_BIND";
const JWT_SECRET_ENV: &str = "SERVICE_LEDGER_JWT_SECRET";

/// Secret shipped in the embedded default; never fit for production
pub const INSECURE_DEFAULT_SECRET: &str = "change-me-service-ledger-secret";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub splits: SplitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Allowed browser origins; empty means any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_days: i64,
    /// Accounts created on startup when the user table is empty
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub worker: Option<Worker>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SplitsConfig {
    #[serde(default = "default_percentage")]
    pub default_employee_percentage: rust_decimal::Decimal,
}

impl Default for SplitsConfig {
    fn default() -> Self {
        Self {
            default_employee_percentage: default_percentage(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_access_minutes() -> i64 {
    15
}

fn default_refresh_days() -> i64 {
    7
}

fn default_cache_ttl() -> i64 {
    crate::domain::sheet_import::DEFAULT_CACHE_TTL_SECS
}

fn default_percentage() -> rust_decimal::Decimal {
    crate::domain::splits::DEFAULT_EMPLOYEE_PERCENTAGE
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
log_level = "info"

[server]
bind_address = "127.0.0.1:3000"
cors_origins = ["http://localhost:5173"]

[database]
url = "sqlite:service_ledger.db"

[auth]
jwt_secret = "change-me-service-ledger-secret"
access_token_minutes = 15
refresh_token_days = 7

[[auth.users]]
username = "admin"
password = "admin"
role = "admin"

[import]
cache_ttl_secs = 300

[splits]
default_employee_percentage = 50
"#;

impl Config {
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Embedded defaults, without environment overrides
    pub fn embedded_default() -> anyhow::Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Apply overrides from `lookup`, normally `std::env::var`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.database.url = url;
        }
        if let Some(bind) = lookup(BIND_ADDRESS_ENV) {
            self.server.bind_address = bind;
        }
        if let Some(secret) = lookup(JWT_SECRET_ENV) {
            self.auth.jwt_secret = secret;
        }
    }

    pub fn uses_insecure_secret(&self) -> bool {
        self.auth.jwt_secret == INSECURE_DEFAULT_SECRET
    }
}

/// Load configuration from config.toml
///
/// Search order:
/// 1. The file named by `SERVICE_LEDGER_CONFIG`
/// 2. config.toml next to the executable
/// 3. The embedded default
///
/// Environment overrides are applied on top in every case.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = match config_file_path() {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            load_config_file(&path)?
        }
        None => {
            tracing::info!("Using default embedded configuration");
            Config::embedded_default()?
        }
    };

    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    Config::from_toml(&contents)
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(explicit));
    }

    let exe_path = std::env::current_exe().ok()?;
    let config_path = exe_path.parent()?.join("config.toml");
    if config_path.exists() {
        Some(config_path)
    } else {
        tracing::warn!("config.toml not found at: {}", config_path.display());
        None
    }
}
