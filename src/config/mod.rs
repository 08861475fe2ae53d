//! Configuration management.
//!
//! Settings come from an optional TOML file layered under environment
//! variables prefixed with `ARXIV_HARVEST_`, using `__` between section and
//! key (e.g. `ARXIV_HARVEST_HARVEST__PAGE_SIZE=50`). Every field has a default,
//! so an empty configuration is valid.

mod file_config;

pub use file_config::{
    default_config_path, find_config_file, save_config, ConfigFileError, LOCAL_CONFIG_FILE,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::harvest::HarvestSettings;
use crate::probe::{ProbeSettings, DATASET_BUCKET_URL};
use crate::sources::ARXIV_API_URL;
use crate::utils::{Backoff, RetryPolicy};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ARXIV_HARVEST";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvest: HarvestConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Paging and pacing settings for the harvester
    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            page_size: self.harvest.page_size,
            max_empty_pages: self.harvest.max_empty_pages,
            page_delay: Duration::from_secs(self.harvest.page_delay_secs),
            write_delay: Duration::from_secs(self.harvest.write_delay_secs),
            retry: self.retry.policy(),
        }
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            base_url: self.probe.base_url.clone(),
            paths: self.probe.paths.clone(),
            timeout: Duration::from_secs(self.probe.timeout_secs),
            links_sample: self.probe.links_sample,
        }
    }
}

/// Harvest section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Directory holding snapshot and report files
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_max_empty_pages")]
    pub max_empty_pages: usize,

    #[serde(default = "default_delay_secs")]
    pub page_delay_secs: u64,

    #[serde(default = "default_delay_secs")]
    pub write_delay_secs: u64,

    /// Per-topic cap when no date range is given
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            metadata_dir: default_metadata_dir(),
            api_url: default_api_url(),
            page_size: default_page_size(),
            max_empty_pages: default_max_empty_pages(),
            page_delay_secs: default_delay_secs(),
            write_delay_secs: default_delay_secs(),
            default_max_results: default_max_results(),
        }
    }
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("./metadata")
}

fn default_api_url() -> String {
    ARXIV_API_URL.to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_max_empty_pages() -> usize {
    3
}

fn default_delay_secs() -> u64 {
    5
}

fn default_max_results() -> usize {
    100
}

/// Retry section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff")]
    pub backoff: Backoff,

    /// Base wait after HTTP 503
    #[serde(default = "default_unavailable_step")]
    pub unavailable_step_secs: u64,

    /// Base wait after a connection failure
    #[serde(default = "default_failure_step")]
    pub failure_step_secs: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff: self.backoff,
            unavailable_step: Duration::from_secs(self.unavailable_step_secs),
            failure_step: Duration::from_secs(self.failure_step_secs),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
            unavailable_step_secs: default_unavailable_step(),
            failure_step_secs: default_failure_step(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff() -> Backoff {
    Backoff::Linear
}

fn default_unavailable_step() -> u64 {
    10
}

fn default_failure_step() -> u64 {
    5
}

/// Probe section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_probe_paths")]
    pub paths: Vec<String>,

    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_links_sample")]
    pub links_sample: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            paths: default_probe_paths(),
            timeout_secs: default_probe_timeout(),
            links_sample: default_links_sample(),
        }
    }
}

fn default_base_url() -> String {
    DATASET_BUCKET_URL.to_string()
}

fn default_probe_paths() -> Vec<String> {
    ProbeSettings::default().paths
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_links_sample() -> usize {
    3
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when neither `-v`/`-q` nor `RUST_LOG` say otherwise
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Also append log lines to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
