// Run configuration
// Built once at startup (defaults <- TOML file <- CLI flags), validated, then
// handed to the pipeline by reference

use crate::error::EtlError;
use crate::extractor::RowPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Page holding the ranked bank table
    pub url: String,

    /// Side file with `Currency,Rate` rows
    pub rates_path: PathBuf,

    pub csv_path: PathBuf,
    pub db_path: PathBuf,

    /// Target table in the SQLite store (replaced on every run)
    pub table_name: String,

    /// Append-only progress log
    pub log_path: PathBuf,

    /// HTTP timeout for the page fetch
    pub timeout_secs: u64,

    pub row_policy: RowPolicy,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            url: DEFAULT_URL.to_string(),
            rates_path: PathBuf::from("data/exchange_rate.csv"),
            csv_path: PathBuf::from("./Largest_banks_data.csv"),
            db_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            log_path: PathBuf::from("./code_log.txt"),
            timeout_secs: 30,
            row_policy: RowPolicy::Strict,
        }
    }
}

impl EtlConfig {
    /// Load a TOML file; keys it leaves out keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self, EtlError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EtlError::config_with(format!("cannot read config file {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
            .map_err(|e| EtlError::config_with(format!("invalid config file {}", path.display()), e))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check every field once, before any stage runs
    pub fn validate(&self) -> Result<(), EtlError> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| EtlError::config_with(format!("invalid url '{}'", self.url), e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(EtlError::config(format!(
                "url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if !is_sql_identifier(&self.table_name) {
            return Err(EtlError::config(format!(
                "table name '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                self.table_name
            )));
        }

        for (field, path) in [
            ("rates_path", &self.rates_path),
            ("csv_path", &self.csv_path),
            ("db_path", &self.db_path),
            ("log_path", &self.log_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(EtlError::config(format!("{field} must not be empty")));
            }
        }

        if self.timeout_secs == 0 {
            return Err(EtlError::config("timeout_secs must be positive"));
        }

        Ok(())
    }
}

/// Table names are spliced into SQL text, so only plain identifiers pass
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
