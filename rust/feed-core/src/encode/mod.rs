// rust/feed-core/src/encode/mod.rs

//! Batch-to-tensor encoding and the two ways of delivering the result.
//!
//! # Example
//!
//! ```no_run
//! use seqfeed_core::config::SlotSchema;
//! use seqfeed_core::dataset::SequenceDataset;
//! use seqfeed_core::encode::{feed_batch, BatchEncoder, ZeroCopySink};
//! use seqfeed_core::engine::{Predictor, SeqPoolEngine, SEQPOOL_OUTPUT};
//!
//! let schema = SlotSchema::new(11, 2);
//! let mut dataset = SequenceDataset::from_path_with_schema("data.txt", &schema, 4)?;
//! let encoder = BatchEncoder::from_schema(&schema);
//! let mut engine = SeqPoolEngine::new(dataset.names().iter().map(|n| encoder.input_name(n)))?;
//!
//! let batch = dataset.next_batch()?;
//! feed_batch(&encoder, batch, &mut ZeroCopySink::new(&mut engine))?;
//! engine.zero_copy_run()?;
//! let output = engine.output(SEQPOOL_OUTPUT)?;
//! # Ok::<(), seqfeed_core::FeedError>(())
//! ```

mod encoder;
mod sink;

pub use encoder::{BatchEncoder, DEFAULT_INPUT_SUFFIX};
pub use sink::{
    feed_batch, run_copy_path, run_zero_copy_path, CopySink, InputSink, ZeroCopySink,
};
