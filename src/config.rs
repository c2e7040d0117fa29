//! Runtime parameters.
//!
//! Loaded once at startup from a JSON parameters file. Validation failures
//! are fatal before any analysis starts; nothing in the engine re-checks
//! these values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::AcceptanceCriteria;

/// Parameter loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read parameter file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parameter file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid parameters: {0}")]
    Invalid(String),
}

/// Chain API connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiParams {
    pub base_url: String,
    pub token: String,
}

/// Screener parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Days ahead of today to include expirations.
    #[serde(default = "default_search_days")]
    pub search_days: i64,

    /// Account size in dollars.
    pub account_size: f64,

    /// Maximum acceptable loss per trade, percent of the account.
    pub max_risk_pct: f64,

    /// Minutes between daemon runs.
    #[serde(default = "default_run_frequency_mins")]
    pub run_frequency_mins: u64,

    /// Watchlist file, one symbol per line.
    #[serde(default = "default_watchlist")]
    pub watchlist: PathBuf,

    /// Directory for exported records.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    pub api: ApiParams,
}

fn default_search_days() -> i64 {
    50
}

fn default_run_frequency_mins() -> u64 {
    60
}

fn default_watchlist() -> PathBuf {
    PathBuf::from("watchlists/default.txt")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out-data")
}

impl Params {
    /// Read, parse and validate a parameters file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let params: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "account_size must be positive, got {}",
                self.account_size
            )));
        }
        if self.max_risk_pct <= 0.0 || self.max_risk_pct > 100.0 {
            return Err(ConfigError::Invalid(format!(
                "max_risk_pct must be in (0, 100], got {}",
                self.max_risk_pct
            )));
        }
        if self.search_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "search_days must be non-negative, got {}",
                self.search_days
            )));
        }
        if self.run_frequency_mins == 0 {
            return Err(ConfigError::Invalid(
                "run_frequency_mins must be at least 1".to_string(),
            ));
        }
        if self.api.base_url.is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".to_string()));
        }
        Ok(())
    }

    /// Trade-acceptance parameters for the spread builder.
    pub fn criteria(&self) -> AcceptanceCriteria {
        AcceptanceCriteria {
            account_size: self.account_size,
            max_risk_pct: self.max_risk_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_json(account_size: f64, max_risk_pct: f64) -> String {
        format!(
            r#"{{
                "account_size": {account_size},
                "max_risk_pct": {max_risk_pct},
                "search_days": 45,
                "api": {{"base_url": "https://api.example.com", "token": "t0ken"}}
            }}"#
        )
    }

    #[test]
    fn test_parse_with_defaults() {
        let params: Params = serde_json::from_str(&params_json(10_000.0, 9.0)).unwrap();
        assert_eq!(params.search_days, 45);
        assert_eq!(params.run_frequency_mins, 60);
        assert_eq!(params.watchlist, PathBuf::from("watchlists/default.txt"));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_criteria_mirrors_params() {
        let params: Params = serde_json::from_str(&params_json(25_000.0, 4.0)).unwrap();
        let criteria = params.criteria();
        assert_eq!(criteria.account_size, 25_000.0);
        assert_eq!(criteria.max_risk_pct, 4.0);
    }

    #[test]
    fn test_zero_account_size_rejected() {
        let params: Params = serde_json::from_str(&params_json(0.0, 9.0)).unwrap();
        assert!(matches!(params.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_risk_pct_rejected() {
        let params: Params = serde_json::from_str(&params_json(10_000.0, 120.0)).unwrap();
        assert!(matches!(params.validate(), Err(ConfigError::Invalid(_))));
    }
}
