//! Configuration loading for patentfetch.
//! Reads patentfetch.toml from the current directory or the path in the
//! PATENTFETCH_CONFIG env var. Every key is optional; a missing file means
//! built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "PATENTFETCH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "patentfetch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Pause between consecutive identifiers, applied after every item but the last.
    #[serde(default = "default_inter_item_delay_ms")]
    pub inter_item_delay_ms: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Write granularity for PDF streaming, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Detail pages live at `<detail_base_url><token>`.
    #[serde(default = "default_detail_base_url")]
    pub detail_base_url: String,
    /// Scheme + host prefix every PDF asset URL starts with.
    #[serde(default = "default_asset_host")]
    pub asset_host: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Additional hosts the HTTP client may contact (e.g. redirect targets).
    #[serde(default)]
    pub extra_allowed_hosts: Vec<String>,
}

fn default_inter_item_delay_ms() -> u64 { 2_000 }
fn default_http_timeout_secs()   -> u64 { 10 }
fn default_chunk_size()          -> usize { 8 * 1024 }
fn default_detail_base_url()     -> String { "https://patents.google.com/patent/".to_string() }
fn default_asset_host()          -> String { "https://patentimages.storage.googleapis.com".to_string() }
fn default_user_agent()          -> String { patentfetch_common::BROWSER_USER_AGENT.to_string() }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: default_inter_item_delay_ms(),
            http_timeout_secs:   default_http_timeout_secs(),
            chunk_size:          default_chunk_size(),
            detail_base_url:     default_detail_base_url(),
            asset_host:          default_asset_host(),
            user_agent:          default_user_agent(),
            extra_allowed_hosts: Vec::new(),
        }
    }
}

impl RetrievalConfig {
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_failure_log")]
    pub failure_log: PathBuf,
}

fn default_output_dir()  -> PathBuf { PathBuf::from("downloaded_patents") }
fn default_failure_log() -> PathBuf { PathBuf::from("patent_download_failures.log") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir(), failure_log: default_failure_log() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Header of the CSV column holding the patent identifiers.
    #[serde(default = "default_column")]
    pub column: String,
}

fn default_column() -> String { "Display Key".to_string() }

impl Default for InputConfig {
    fn default() -> Self {
        Self { column: default_column() }
    }
}

mod tests;

impl Config {
    /// Load configuration from patentfetch.toml.
    /// Checks PATENTFETCH_CONFIG first, then the current directory. Falls back
    /// to defaults when no file exists at the resolved path.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&path).exists() {
            tracing::debug!("No config file at {}, using defaults", path);
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load and validate a specific config file. The file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retrieval;
        if r.chunk_size == 0 {
            return Err(ConfigError::Invalid("retrieval.chunk_size must be greater than zero".into()));
        }
        if r.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("retrieval.http_timeout_secs must be greater than zero".into()));
        }
        check_http_url("retrieval.detail_base_url", &r.detail_base_url)?;
        check_http_url("retrieval.asset_host", &r.asset_host)?;
        if self.input.column.trim().is_empty() {
            return Err(ConfigError::Invalid("input.column must not be empty".into()));
        }
        Ok(())
    }
}

fn check_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::Invalid(format!("{key}: {value:?} is not a URL ({e})")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{key}: {value:?} must be an http(s) URL with a host")));
    }
    Ok(())
}
