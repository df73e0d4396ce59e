//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// JSON account snapshot the paper broker trades against.
    pub snapshot: PathBuf,
    /// Write fills back to the snapshot after a live run.
    #[serde(default = "default_true")]
    pub save_fills: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_interval")]
    pub order_interval_ms: u64,
    #[serde(default = "default_max_orders")]
    pub max_orders_per_run: usize,
    /// Deposits below this amount are not planned.
    #[serde(default = "default_min_deposit")]
    pub min_deposit_usd: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            order_interval_ms: default_interval(),
            max_orders_per_run: default_max_orders(),
            min_deposit_usd: default_min_deposit(),
        }
    }
}

fn default_interval() -> u64 {
    100
}
fn default_max_orders() -> usize {
    50
}
fn default_min_deposit() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.broker.snapshot.as_os_str().is_empty() {
            return Err(Error::Config("broker snapshot path must not be empty".into()));
        }
        if self.account.id.is_empty() {
            return Err(Error::Config("account id must not be empty".into()));
        }
        if self.execution.max_orders_per_run == 0 {
            return Err(Error::Config("max_orders_per_run must be > 0".into()));
        }
        if !self.execution.min_deposit_usd.is_finite() || self.execution.min_deposit_usd < 0.0 {
            return Err(Error::Config("min_deposit_usd must be >= 0".into()));
        }
        if self.logging.audit_file.is_empty() {
            return Err(Error::Config("audit_file must not be empty".into()));
        }
        Ok(())
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[broker]
snapshot = "account.json"

[account]
id = "ROTH-IRA"

[execution]
order_interval_ms = 250
max_orders_per_run = 20
min_deposit_usd = 50.0

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.broker.snapshot, PathBuf::from("account.json"));
        assert!(config.broker.save_fills);
        assert_eq!(config.account.id, "ROTH-IRA");
        assert_eq!(config.execution.order_interval_ms, 250);
        assert_eq!(config.execution.max_orders_per_run, 20);
        assert_eq!(config.execution.min_deposit_usd, 50.0);
    }

    #[test]
    fn optional_sections_default() {
        let config = Config::from_toml(
            r#"
[broker]
snapshot = "account.json"
save_fills = false

[account]
id = "X"
"#,
        )
        .unwrap();
        assert!(!config.broker.save_fills);
        assert_eq!(config.execution.order_interval_ms, 100);
        assert_eq!(config.execution.max_orders_per_run, 50);
        assert_eq!(config.execution.min_deposit_usd, 1.0);
        assert_eq!(config.logging.audit_file, "audit.jsonl");
    }

    #[test]
    fn missing_broker_section_fails() {
        assert!(matches!(
            Config::from_toml("[account]\nid = \"X\"\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn validate_catches_empty_account() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.account.id.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_max_orders() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.execution.max_orders_per_run = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_negative_min_deposit() {
        let mut config: Config = toml::from_str(example_toml()).unwrap();
        config.execution.min_deposit_usd = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn audit_path() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.audit_path(), PathBuf::from("./logs/audit.jsonl"));
    }
}
