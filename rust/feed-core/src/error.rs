// rust/feed-core/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Storage error at '{path}': {message}")]
    Storage {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Malformed record at line {line}: {message}")]
    Malformed {
        line: usize,
        message: String,
    },

    #[error("Schema violation{}: {message}", slot.as_ref().map(|s| format!(" in slot '{s}'")).unwrap_or_default())]
    Schema {
        slot: Option<String>,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Batch size {batch_size} exceeds sample count {num_samples}, no batches available")]
    Capacity {
        batch_size: usize,
        num_samples: usize,
    },

    #[error("Engine error: {message}")]
    Engine {
        message: String,
    },

    #[error("Output mismatch at index {index}: expected {expected}, got {actual} (tolerance {tolerance})")]
    OutputMismatch {
        index: usize,
        expected: f32,
        actual: f32,
        tolerance: f32,
    },
}

pub type Result<T> = std::result::Result<T, FeedError>;

// Convenience constructors
impl FeedError {

    pub fn storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            slot: None,
            message: message.into(),
        }
    }

    pub fn slot_schema(slot: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            slot: Some(slot.into()),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn capacity(batch_size: usize, num_samples: usize) -> Self {
        Self::Capacity {
            batch_size,
            num_samples,
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    pub fn mismatch(index: usize, expected: f32, actual: f32, tolerance: f32) -> Self {
        Self::OutputMismatch {
            index,
            expected,
            actual,
            tolerance,
        }
    }

    /// Whether the dataset is still usable after this error.
    ///
    /// Only the capacity condition is recoverable; everything else is raised
    /// while loading and means no dataset was constructed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Capacity { .. })
    }
}
