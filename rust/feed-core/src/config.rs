// rust/feed-core/src/config.rs

//! Configuration for dataset loading and batch encoding.
//!
//! Configuration is parsed from TOML, can be overridden through `SEQFEED_*`
//! environment variables, and is validated before use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{FeedError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub schema: SlotSchema,
    pub storage: StorageConfig,
    pub batching: BatchingConfig,
}

/// Layout of the input records.
///
/// The loader never hard-codes these values, so synthetic schemas can be
/// used in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSchema {
    /// Number of values in one group (row) of a sequence.
    pub group_width: usize,
    /// Number of distinct slot names every sample carries.
    pub num_names: usize,
    /// Separates the slot name from its values.
    pub field_delimiter: char,
    /// Separates individual values.
    pub value_delimiter: char,
    /// Appended to a slot name to form the engine input name.
    pub input_suffix: String,
}

impl SlotSchema {
    /// Creates a schema with the default delimiters and suffix.
    pub fn new(group_width: usize, num_names: usize) -> Self {
        Self {
            group_width,
            num_names,
            ..Default::default()
        }
    }
}

// Storage configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    // Base path relative dataset paths are resolved against.
    pub base_path: PathBuf,
    // Buffer size in bytes for buffered reads.
    pub buffer_size: usize,
    // Whether to use memory-mapped I/O.
    pub use_mmap: bool,
    // File size threshold (bytes) above which to use mmap.
    pub mmap_threshold: u64,
}

/// Batching options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
}

impl Default for SlotSchema {
    fn default() -> Self {
        Self {
            group_width: 11,
            num_names: 154,
            field_delimiter: '\t',
            value_delimiter: ' ',
            input_suffix: "_embed".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            buffer_size: 64 * 1024, // 64 KB
            use_mmap: true,
            mmap_threshold: 1024 * 1024, // 1 MB
        }
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self { batch_size: 1 }
    }
}

impl FromStr for FeedConfig {
    type Err = FeedError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| FeedError::config_with_source("failed to parse TOML config", e))
    }
}

impl FeedConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FeedError::storage_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Variables are prefixed with `SEQFEED_` followed by the section and
    // field name, e.g. `SEQFEED_SCHEMA_GROUP_WIDTH` or
    // `SEQFEED_BATCHING_BATCH_SIZE`. Values that fail to parse are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        // Schema overrides
        if let Ok(val) = std::env::var("SEQFEED_SCHEMA_GROUP_WIDTH") {
            if let Ok(v) = val.parse() {
                self.schema.group_width = v;
            }
        }
        if let Ok(val) = std::env::var("SEQFEED_SCHEMA_NUM_NAMES") {
            if let Ok(v) = val.parse() {
                self.schema.num_names = v;
            }
        }
        if let Ok(val) = std::env::var("SEQFEED_SCHEMA_INPUT_SUFFIX") {
            self.schema.input_suffix = val;
        }

        // Storage overrides
        if let Ok(val) = std::env::var("SEQFEED_STORAGE_BASE_PATH") {
            self.storage.base_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("SEQFEED_STORAGE_BUFFER_SIZE") {
            if let Ok(v) = val.parse() {
                self.storage.buffer_size = v;
            }
        }
        if let Ok(val) = std::env::var("SEQFEED_STORAGE_USE_MMAP") {
            if let Ok(v) = val.parse() {
                self.storage.use_mmap = v;
            }
        }
        if let Ok(val) = std::env::var("SEQFEED_STORAGE_MMAP_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.storage.mmap_threshold = v;
            }
        }

        // Batching overrides
        if let Ok(val) = std::env::var("SEQFEED_BATCHING_BATCH_SIZE") {
            if let Ok(v) = val.parse() {
                self.batching.batch_size = v;
            }
        }

        self
    }

    // Validate all configuration values.
    //
    // # Errors
    //
    // Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()?;

        if self.storage.buffer_size == 0 {
            return Err(FeedError::config(
                "storage.buffer_size must be greater than 0",
            ));
        }

        if self.batching.batch_size == 0 {
            return Err(FeedError::config(
                "batching.batch_size must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl SlotSchema {
    /// Validate the record layout.
    pub fn validate(&self) -> Result<()> {
        if self.group_width == 0 {
            return Err(FeedError::config(
                "schema.group_width must be greater than 0",
            ));
        }
        if self.num_names == 0 {
            return Err(FeedError::config(
                "schema.num_names must be greater than 0",
            ));
        }
        if self.field_delimiter == self.value_delimiter {
            return Err(FeedError::config(
                "schema.field_delimiter and schema.value_delimiter must differ",
            ));
        }
        Ok(())
    }
}

/// Serializes tests that read or write `SEQFEED_*` variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
