// rust/feed-core/src/lib.rs

//! Sequence Feed - Core Library
//!
//! This crate loads variable-length sequence datasets, groups them into
//! fixed-size batches, encodes each batch as level-of-detail tensors and
//! delivers them to a predictor either by copying or by writing into the
//! predictor's own input buffers.

pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{BatchingConfig, FeedConfig, SlotSchema, StorageConfig};
pub use error::{FeedError, Result};
pub use storage::{LocalStorage, ObjectMeta, StorageBackend, StorageReader};

pub mod dataset;
pub use dataset::{
    Batch, CyclicCursor, DelimitedFormat, Record, RecordFormat, SequenceDataset, Slot,
};

pub mod tensor;
pub use tensor::{DType, OwnedTensor, TensorDescriptor};

pub mod engine;
pub use engine::{Predictor, SeqPoolEngine, ZeroCopyTensor, SEQPOOL_OUTPUT};

pub mod encode;
pub use encode::{feed_batch, BatchEncoder, CopySink, InputSink, ZeroCopySink};

pub mod runtime;
pub use runtime::FeedRuntime;
