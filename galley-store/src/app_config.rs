use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub vat_rate: f64,
    /// Price difference between adjacent sizes when a size price is missing
    #[serde(default = "default_size_step")]
    pub size_step: f64,
}

fn default_size_step() -> f64 {
    10.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default = "default_window")]
    pub rolling_window_minutes: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rolling_window_minutes: default_window(),
        }
    }
}

fn default_window() -> i64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    /// Completed orders kept for status lookups; older ones are dropped
    #[serde(default = "default_retain_completed")]
    pub retain_completed_orders: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            retain_completed_orders: default_retain_completed(),
        }
    }
}

fn default_retain_completed() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: Backend,
    pub redis_url: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            redis_url: None,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub menu_path: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `GALLEY__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("GALLEY").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
