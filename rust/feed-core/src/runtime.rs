// rust/feed-core/src/runtime.rs

//! Configuration-driven entry point.
//!
//! `FeedRuntime` owns a validated configuration and the storage backend it
//! describes, and builds datasets and encoders from them.
//!
//! # Example
//!
//! ```no_run
//! use seqfeed_core::FeedRuntime;
//!
//! let runtime = FeedRuntime::from_config_file("seqfeed.toml").unwrap();
//! let mut dataset = runtime.load_dataset("data.txt").unwrap();
//! let encoder = runtime.encoder();
//!
//! let batch = dataset.next_batch().unwrap();
//! let tensors = encoder.encode_batch(batch);
//! println!("{} inputs in batch {}", tensors.len(), batch.index());
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::config::FeedConfig;
use crate::dataset::SequenceDataset;
use crate::encode::BatchEncoder;
use crate::error::Result;
use crate::storage::{LocalStorage, StorageBackend};

/// Owns configuration and storage, and builds datasets from them.
pub struct FeedRuntime {
    config: FeedConfig,
    storage: Arc<dyn StorageBackend>,
}

impl FeedRuntime {
    /// Creates a runtime with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::from_config(FeedConfig::default())
    }

    /// Creates a runtime from a TOML configuration file.
    ///
    /// Environment variable overrides are applied after loading the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or is invalid.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = FeedConfig::from_file(path)?.with_env_overrides();
        Self::from_config(config)
    }

    /// Creates a runtime from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the storage
    /// backend cannot be initialized.
    pub fn from_config(config: FeedConfig) -> Result<Self> {
        config.validate()?;

        let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(&config.storage)?);

        Ok(Self { config, storage })
    }

    /// Loads a dataset with the configured batch size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or violates the schema.
    pub fn load_dataset(&self, path: impl AsRef<Path>) -> Result<SequenceDataset> {
        self.load_dataset_with_batch_size(path, self.config.batching.batch_size)
    }

    /// Loads a dataset with an explicit batch size.
    pub fn load_dataset_with_batch_size(
        &self,
        path: impl AsRef<Path>,
        batch_size: usize,
    ) -> Result<SequenceDataset> {
        SequenceDataset::open(
            self.storage.as_ref(),
            path.as_ref(),
            &self.config.schema,
            batch_size,
        )
    }

    /// An encoder using the configured input suffix.
    pub fn encoder(&self) -> BatchEncoder {
        BatchEncoder::from_schema(&self.config.schema)
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }
}

impl std::fmt::Debug for FeedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedRuntime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotSchema;
    use crate::error::FeedError;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_runtime(batch_size: usize) -> (FeedRuntime, TempDir) {
        let temp_dir = TempDir::new().unwrap();

        let mut config = FeedConfig::default();
        config.schema = SlotSchema::new(2, 2);
        config.storage.base_path = temp_dir.path().to_path_buf();
        config.batching.batch_size = batch_size;

        let runtime = FeedRuntime::from_config(config).unwrap();
        (runtime, temp_dir)
    }

    fn create_test_file(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
        std::fs::write(temp_dir.path().join(name), content).unwrap();
        PathBuf::from(name)
    }

    const DATA: &str = "a\t1 2\nb\t3 4 5 6\na\t7 8\nb\t9 10\na\t11 12\nb\t13 14\n";

    #[test]
    fn test_load_dataset_relative_to_base_path() {
        let (runtime, temp_dir) = create_test_runtime(2);
        let path = create_test_file(&temp_dir, "data.txt", DATA);

        let dataset = runtime.load_dataset(&path).unwrap();
        assert_eq!(dataset.num_samples(), 3);
        assert_eq!(dataset.batch_size(), 2);
        assert_eq!(dataset.num_batches(), 1);
        assert_eq!(dataset.batches()[0].slot("b").unwrap().lod(), &[0, 2, 3]);
    }

    #[test]
    fn test_load_dataset_with_batch_size() {
        let (runtime, temp_dir) = create_test_runtime(2);
        let path = create_test_file(&temp_dir, "data.txt", DATA);

        let dataset = runtime.load_dataset_with_batch_size(&path, 1).unwrap();
        assert_eq!(dataset.num_batches(), 3);
    }

    #[test]
    fn test_load_missing_dataset() {
        let (runtime, _temp) = create_test_runtime(1);
        let err = runtime.load_dataset("missing.txt").unwrap_err();
        assert!(matches!(err, FeedError::Storage { .. }));
    }

    #[test]
    fn test_encoder_uses_configured_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = FeedConfig::default();
        config.storage.base_path = temp_dir.path().to_path_buf();
        config.schema.input_suffix = "_feat".to_string();

        let runtime = FeedRuntime::from_config(config).unwrap();
        assert_eq!(runtime.encoder().input_name("q"), "q_feat");
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = FeedConfig::default();
        config.batching.batch_size = 0;
        assert!(FeedRuntime::from_config(config).is_err());
    }

    #[test]
    fn test_config_file_loading() {
        let _guard = crate::config::ENV_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let temp_dir = TempDir::new().unwrap();

        let config_content = format!(
            r#"
            [schema]
            group_width = 2
            num_names = 2

            [storage]
            base_path = "{}"

            [batching]
            batch_size = 3
            "#,
            temp_dir.path().display()
        );

        let config_path = temp_dir.path().join("seqfeed.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let runtime = FeedRuntime::from_config_file(&config_path).unwrap();
        assert_eq!(runtime.config().batching.batch_size, 3);

        create_test_file(&temp_dir, "data.txt", DATA);
        let dataset = runtime.load_dataset("data.txt").unwrap();
        assert_eq!(dataset.num_batches(), 1);
    }

    #[test]
    fn test_runtime_storage_access() {
        let (runtime, temp_dir) = create_test_runtime(1);
        create_test_file(&temp_dir, "data.txt", DATA);

        assert!(runtime.storage().exists(Path::new("data.txt")).unwrap());
    }
}
