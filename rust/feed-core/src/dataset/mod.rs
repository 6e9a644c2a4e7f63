// rust/feed-core/src/dataset/mod.rs

//! Sequence dataset loading and batching.
//!
//! A dataset file holds one record per line, `<name>\t<values>`, where each
//! sample contributes one line per slot name. The loader parses and
//! validates the whole file, splits the samples into fixed-size batches, and
//! serves them through a cursor that wraps around at the end.
//!
//! # Example
//!
//! ```no_run
//! use seqfeed_core::config::SlotSchema;
//! use seqfeed_core::dataset::SequenceDataset;
//!
//! let schema = SlotSchema::new(11, 154);
//! let mut dataset = SequenceDataset::from_path_with_schema("data.txt", &schema, 32)?;
//!
//! let batch = dataset.next_batch()?;
//! for slot in batch {
//!     println!("{}: shape {:?}, lod {:?}", slot.name(), slot.shape(), slot.lod());
//! }
//! # Ok::<(), seqfeed_core::FeedError>(())
//! ```

mod batch;
mod cursor;
mod format;
mod loader;

pub use batch::{Batch, Slot};
pub use cursor::CyclicCursor;
pub use format::{DelimitedFormat, Record, RecordFormat};
pub use loader::SequenceDataset;
