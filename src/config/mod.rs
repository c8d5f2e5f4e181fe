//! Configuration for llama-chains.
//!
//! A [`Config`] is built once at process start and passed down explicitly:
//! defaults, then an optional TOML file, then environment variables, then
//! command-line flags (applied by the CLI).

pub mod browser;
pub mod table;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use browser::BrowserEngineConfig;
pub use table::{TableSelectors, Timing};

/// Page holding the chain ranking table.
pub const DEFAULT_TARGET_URL: &str = "https://defillama.com/chains";

/// Default CSV output path.
pub const DEFAULT_OUTPUT_PATH: &str = "defillama_data.csv";

/// Default append-only log file.
pub const DEFAULT_LOG_FILE: &str = "logs_info.log";

/// Default seconds between scraping cycles.
pub const DEFAULT_DOWNLOAD_INTERVAL: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("DOWNLOAD_INTERVAL must be a whole number of seconds, got {0:?}")]
    InvalidInterval(String),
    #[error("Invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Page to scrape.
    pub target_url: String,
    /// CSV file rewritten after every successful cycle.
    pub output_path: PathBuf,
    /// Seconds to wait between cycles.
    pub download_interval: u64,
    /// Proxy server for browser traffic (e.g. "127.0.0.1:8080").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Log file, appended to.
    pub log_file: PathBuf,
    pub browser: BrowserEngineConfig,
    pub selectors: TableSelectors,
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            download_interval: DEFAULT_DOWNLOAD_INTERVAL,
            proxy: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            browser: BrowserEngineConfig::default(),
            selectors: TableSelectors::default(),
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// - `DOWNLOAD_INTERVAL` - seconds between cycles
    /// - `PROXY` - proxy server for the browser; empty means none
    /// - `CHROME_PATH` - Chrome executable
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(val) = lookup("DOWNLOAD_INTERVAL") {
            self.download_interval = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidInterval(val.clone()))?;
        }

        if let Some(val) = lookup("PROXY") {
            self.proxy = normalize_proxy(&val);
        }

        if let Some(val) = lookup("CHROME_PATH") {
            if !val.is_empty() {
                self.browser.chrome_path = Some(PathBuf::from(val));
            }
        }

        Ok(self)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.target_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.target_url.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn download_interval(&self) -> Duration {
        Duration::from_secs(self.download_interval)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Blank proxy settings mean "no proxy".
pub fn normalize_proxy(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
