//! Application configuration: TOML settings plus secrets from the environment.
//!
//! Settings carry endpoints and the database path and are safe to log.
//! Secrets come only from the process environment (optionally seeded from a
//! `.env` file) and are redacted from `Debug` output.

use crate::gateway::{DbLocation, GatewayConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickerstat_core::data::{alpha_vantage, cryptocompare, AlphaVantageSource, CryptoCompareSource};

pub const STOCK_API_KEY_VAR: &str = "TICKERSTAT_STOCK_API_KEY";
pub const CRYPTO_API_KEY_VAR: &str = "TICKERSTAT_CRYPTO_API_KEY";
pub const DB_PASSWORD_VAR: &str = "TICKERSTAT_DB_PASSWORD";

pub const DEFAULT_DB_PATH: &str = "tickerstat.db";

/// The only error that stops the process at startup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("required environment variable {var} is missing or empty")]
    MissingSecret { var: &'static str },

    #[error("read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    pub base_url: String,
    /// Query string passed through to the vendor, without the api key.
    pub params: String,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            base_url: alpha_vantage::DEFAULT_BASE_URL.to_string(),
            params: alpha_vantage::DEFAULT_PARAMS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoSettings {
    pub base_url: String,
    pub symbol: String,
    /// Number of days of history.
    pub limit: u32,
}

impl Default for CryptoSettings {
    fn default() -> Self {
        Self {
            base_url: cryptocompare::DEFAULT_BASE_URL.to_string(),
            symbol: cryptocompare::DEFAULT_SYMBOL.to_string(),
            limit: cryptocompare::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

/// Non-secret settings, loadable from TOML. Every key has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stocks: StockSettings,
    pub crypto: CryptoSettings,
    pub database: DatabaseSettings,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }
}

/// Credentials read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub stock_api_key: String,
    pub crypto_api_key: String,
    pub db_password: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve secrets through `lookup`; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let required =
            |var: &'static str| get(var).ok_or(ConfigurationError::MissingSecret { var });

        Ok(Self {
            stock_api_key: required(STOCK_API_KEY_VAR)?,
            crypto_api_key: get(CRYPTO_API_KEY_VAR).unwrap_or_default(),
            db_password: required(DB_PASSWORD_VAR)?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("stock_api_key", &"<redacted>")
            .field("crypto_api_key", &"<redacted>")
            .field("db_password", &"<redacted>")
            .finish()
    }
}

/// Everything the commander needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub secrets: Secrets,
}

impl AppConfig {
    /// Load `.env` (if present), then the optional TOML file, then secrets.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        dotenv::dotenv().ok();
        let settings = match path {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        Ok(Self {
            settings,
            secrets: Secrets::from_env()?,
        })
    }

    pub fn stock_source(&self) -> AlphaVantageSource {
        AlphaVantageSource::new(
            &self.settings.stocks.base_url,
            &self.settings.stocks.params,
            &self.secrets.stock_api_key,
        )
    }

    pub fn crypto_source(&self) -> CryptoCompareSource {
        CryptoCompareSource::new(
            &self.settings.crypto.base_url,
            &self.settings.crypto.symbol,
            self.settings.crypto.limit,
            &self.secrets.crypto_api_key,
        )
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            location: DbLocation::parse(&self.settings.database.path),
            password: Some(self.secrets.db_password.clone()),
        }
    }
}
