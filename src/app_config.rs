use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::time::Duration;

/// Application configuration module
/// This module handles the crate configuration including loading,
/// validating and saving configuration settings.
/// Represents the crate configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Locale identifier used to build the transliteration table (e.g. "ru_RU", "bg_BG")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Batch sizes for the background conversion
    #[serde(default)]
    pub batch: BatchConfig,

    /// Delay before the first tick fires after activation, in seconds
    #[serde(default = "default_activation_delay_secs")]
    pub activation_delay_secs: u64,

    /// Delay between self-rearmed ticks, in seconds
    #[serde(default = "default_reschedule_delay_secs")]
    pub reschedule_delay_secs: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Execution context for a conversion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchContext {
    // @context: Primary-source pass (posts)
    Posts,
    // @context: Secondary-source pass (taxonomy terms)
    Terms,
}

impl std::fmt::Display for BatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Posts => write!(f, "posts"),
            Self::Terms => write!(f, "terms"),
        }
    }
}

/// Batch size configuration, context-tagged so posts and terms can use
/// different sizes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Records per tick for the posts pass
    #[serde(default = "default_batch_size")]
    pub posts: usize,

    /// Records per tick for the terms pass
    #[serde(default = "default_batch_size")]
    pub terms: usize,
}

impl BatchConfig {
    /// Resolve the batch size for a pass, clamped to [1, 2000].
    ///
    /// Values below 1 fall back to the default; values above 2000 clamp.
    pub fn size_for(&self, context: BatchContext) -> usize {
        let size = match context {
            BatchContext::Posts => self.posts,
            BatchContext::Terms => self.terms,
        };

        if size < 1 {
            default_batch_size()
        } else if size > MAX_BATCH_SIZE {
            MAX_BATCH_SIZE
        } else {
            size
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            posts: default_batch_size(),
            terms: default_batch_size(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Upper bound for a single conversion page
pub const MAX_BATCH_SIZE: usize = 2000;

fn default_batch_size() -> usize {
    200
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_activation_delay_secs() -> u64 {
    // Soon, but not immediately, to avoid activation timeouts.
    15
}

fn default_reschedule_delay_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path.as_ref(), e))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.locale.trim().is_empty() {
            return Err(anyhow!("Locale must not be empty"));
        }

        if self.reschedule_delay_secs == 0 {
            return Err(anyhow!("Reschedule delay must be at least one second"));
        }

        Ok(())
    }

    /// Delay before the first tick after activation
    pub fn activation_delay(&self) -> Duration {
        Duration::from_secs(self.activation_delay_secs)
    }

    /// Delay between self-rearmed ticks
    pub fn reschedule_delay(&self) -> Duration {
        Duration::from_secs(self.reschedule_delay_secs)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            locale: default_locale(),
            batch: BatchConfig::default(),
            activation_delay_secs: default_activation_delay_secs(),
            reschedule_delay_secs: default_reschedule_delay_secs(),
            log_level: LogLevel::default(),
        }
    }
}
