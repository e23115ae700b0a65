use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Postal-code lookup service settings.
///
/// Timeout and retry budget are explicit; retries cover transport
/// failures and 5xx answers and are off by default.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_lookup_base_url(),
            timeout_seconds: default_lookup_timeout(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_seconds: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Overrides for the built-in rate table. Empty means built-in data.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RatesConfig {
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    /// Two-digit postal prefix -> region name
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionConfig {
    pub code: String,
    pub name: String,
    pub average_rent: i64,
}

fn default_lookup_base_url() -> String {
    "https://zipcloud.ibsnet.co.jp/api/search".to_string()
}

fn default_lookup_timeout() -> u64 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_database_path() -> String {
    "./data/living_cost.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

/// Load configuration from an optional TOML file, overridden by
/// `LIVING_COST__*` environment variables.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("LIVING_COST").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.lookup.base_url.trim().is_empty() {
        anyhow::bail!("lookup.base_url cannot be empty");
    }

    if cfg.lookup.timeout_seconds == 0 {
        anyhow::bail!("lookup.timeout_seconds must be greater than 0");
    }

    if cfg.database.path.trim().is_empty() {
        anyhow::bail!("database.path cannot be empty");
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be greater than 0");
    }

    match cfg.logging.format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid logging.format '{}': expected text or json", other),
    }

    if cfg.history.default_page_size == 0 || cfg.history.max_page_size == 0 {
        anyhow::bail!("history page sizes must be greater than 0");
    }

    if cfg.history.default_page_size > cfg.history.max_page_size {
        anyhow::bail!(
            "history.default_page_size ({}) exceeds history.max_page_size ({})",
            cfg.history.default_page_size,
            cfg.history.max_page_size
        );
    }

    validate_rates(&cfg.rates)
}

fn validate_rates(rates: &RatesConfig) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for region in &rates.regions {
        if region.name.trim().is_empty() {
            anyhow::bail!("Region '{}' has an empty name", region.code);
        }
        if region.average_rent < 0 {
            anyhow::bail!("Region '{}' has a negative average_rent", region.name);
        }
        if !seen.insert(region.name.as_str()) {
            anyhow::bail!("Duplicate region name: {}", region.name);
        }
    }

    for (prefix, name) in &rates.prefixes {
        if prefix.len() != 2 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            anyhow::bail!("Prefix '{}' must be exactly two digits", prefix);
        }
        if name.trim().is_empty() {
            anyhow::bail!("Prefix '{}' maps to an empty region name", prefix);
        }
    }

    Ok(())
}
