// rust/feed-core/src/storage/mod.rs

//! Read-only storage abstraction for dataset sources.
//!
//! Datasets are read exactly once and fully materialized, so the backends
//! only expose what the loader needs: existence checks, metadata and a
//! reader that can hand back the whole object.
//!
//! # Example
//!
//! ```no_run
//! use seqfeed_core::config::StorageConfig;
//! use seqfeed_core::storage::{LocalStorage, StorageBackend};
//! use std::path::Path;
//!
//! let storage = LocalStorage::new(&StorageConfig::default()).unwrap();
//! let mut reader = storage.open_read(Path::new("data.txt")).unwrap();
//! let bytes = reader.read_all().unwrap();
//! assert_eq!(bytes.len() as u64, reader.size());
//! ```

mod local;
mod traits;

pub use local::LocalStorage;
pub use traits::{ObjectMeta, StorageBackend, StorageReader};
