//! Configuration management

use anyhow::bail;
use queuestack_core::StorageAccount;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub samples: SampleSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(default = "default_true")]
    pub emulated: bool,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, skip_serializing)]
    pub key: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            emulated: default_true(),
            name: None,
            key: None,
        }
    }
}

impl AccountConfig {
    /// Resolve the account the samples run against
    pub fn storage_account(&self) -> anyhow::Result<StorageAccount> {
        if self.emulated {
            return Ok(StorageAccount::emulator());
        }
        match (&self.name, &self.key) {
            (Some(name), Some(key)) => Ok(StorageAccount::new(name.clone(), key.clone())),
            _ => bail!("account name and key are required unless running against the emulator"),
        }
    }
}

/// Knobs of the sample procedures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SampleSettings {
    #[serde(default = "default_basic_queue_count")]
    pub basic_queue_count: usize,

    #[serde(default = "default_advanced_queue_count")]
    pub advanced_queue_count: usize,

    #[serde(default = "default_message_count")]
    pub message_count: usize,

    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    #[serde(default = "default_peek_count")]
    pub peek_count: u32,

    #[serde(default = "default_dequeue_batch")]
    pub dequeue_batch: u32,
}

impl SampleSettings {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            basic_queue_count: default_basic_queue_count(),
            advanced_queue_count: default_advanced_queue_count(),
            message_count: default_message_count(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            peek_count: default_peek_count(),
            dequeue_batch: default_dequeue_batch(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_basic_queue_count() -> usize {
    6
}

fn default_advanced_queue_count() -> usize {
    5
}

fn default_message_count() -> usize {
    10
}

fn default_visibility_timeout_secs() -> u64 {
    60
}

fn default_peek_count() -> u32 {
    5
}

fn default_dequeue_batch() -> u32 {
    32
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Without an explicit path an optional `queuestack.toml` in the working
    /// directory is read. Nested keys can be overridden from the environment,
    /// e.g. `QUEUESTACK_SAMPLES__MESSAGE_COUNT=20`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("queuestack").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("QUEUESTACK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }
}
