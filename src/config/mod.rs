//! Configuration management.
//!
//! [`ClientOptions`] is the validated, typed option set every component reads.
//! [`Settings`] loads the same options from layered sources with priority:
//! 1. Default values (hardcoded)
//! 2. Config file (explicit path, else `$CONFIG_PATH`)
//! 3. Environment variables prefixed `APOLLO__` (highest priority)
//!

mod options;
mod retry;
pub use options::*;
pub use retry::*;


//---
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::constants::ENV_PREFIX;
use crate::Result;

/// Raw, file / environment shaped settings. Durations are in milliseconds.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub host: String,

    pub app_id: String,

    #[serde(default)]
    pub cluster: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub ip: Option<String>,

    #[serde(default)]
    pub data_center: Option<String>,

    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,

    #[serde(default = "default_fetch_interval_ms")]
    pub fetch_interval_ms: u64,

    #[serde(default = "default_true")]
    pub fetch_cached_config: bool,

    #[serde(default = "default_true")]
    pub enable_update_notification: bool,

    #[serde(default = "default_retry_unit_delay_ms")]
    pub retry_unit_delay_ms: u64,

    #[serde(default = "default_polling_timeout_ms")]
    pub polling_timeout_ms: u64,

    #[serde(default)]
    pub skip_init_fetch_if_cache_found: bool,

    #[serde(default)]
    pub enable_fetch: bool,

    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the optional file and the environment, later
    /// sources overriding earlier ones.
    ///
    /// # Arguments
    /// * `path` - Optional config file; falls back to `$CONFIG_PATH`
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        // 1. Config file
        let file = path.map(str::to_string).or_else(|| env::var("CONFIG_PATH").ok());
        if let Some(file) = file {
            config = config.add_source(File::with_name(&file).required(true));
        }

        // 2. Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(config.build()?.try_deserialize()?)
    }

    /// Validates the settings into [`ClientOptions`]
    pub fn into_options(self) -> Result<ClientOptions> {
        let mut builder = ClientOptions::builder(self.host, self.app_id)
            .fetch_interval(Duration::from_millis(self.fetch_interval_ms))
            .fetch_cached_config(self.fetch_cached_config)
            .enable_update_notification(self.enable_update_notification)
            .retry_unit_delay(Duration::from_millis(self.retry_unit_delay_ms))
            .polling_timeout(Duration::from_millis(self.polling_timeout_ms))
            .skip_init_fetch_if_cache_found(self.skip_init_fetch_if_cache_found)
            .enable_fetch(self.enable_fetch);

        if let Some(cluster) = self.cluster {
            builder = builder.cluster(cluster);
        }
        if let Some(namespace) = self.namespace {
            builder = builder.namespace(namespace);
        }
        if let Some(ip) = self.ip {
            builder = builder.ip(ip);
        }
        if let Some(data_center) = self.data_center {
            builder = builder.data_center(data_center);
        }
        if let Some(ms) = self.fetch_timeout_ms {
            builder = builder.fetch_timeout(Duration::from_millis(ms));
        }
        if let Some(dir) = self.cache_dir {
            builder = builder.cache_dir(dir);
        }

        builder.build()
    }
}

fn default_true() -> bool {
    true
}
fn default_fetch_interval_ms() -> u64 {
    crate::constants::DEFAULT_FETCH_INTERVAL.as_millis() as u64
}
fn default_retry_unit_delay_ms() -> u64 {
    crate::constants::DEFAULT_RETRY_UNIT_DELAY.as_millis() as u64
}
fn default_polling_timeout_ms() -> u64 {
    crate::constants::DEFAULT_POLLING_TIMEOUT.as_millis() as u64
}
