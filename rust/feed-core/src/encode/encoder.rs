// rust/feed-core/src/encode/encoder.rs

use crate::config::SlotSchema;
use crate::dataset::{Batch, Slot};
use crate::tensor::TensorDescriptor;

/// Default suffix appended to slot names to form engine input names.
pub const DEFAULT_INPUT_SUFFIX: &str = "_embed";

/// Turns batch slots into tensor descriptors.
///
/// Encoding is a pure view transform: the descriptor borrows the slot's
/// values and offsets, and only the input name is allocated.
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    suffix: String,
}

impl Default for BatchEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SUFFIX)
    }
}

impl BatchEncoder {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn from_schema(schema: &SlotSchema) -> Self {
        Self::new(schema.input_suffix.clone())
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Engine input name for a slot name.
    pub fn input_name(&self, slot_name: &str) -> String {
        format!("{slot_name}{}", self.suffix)
    }

    pub fn encode_slot<'a>(&self, slot: &'a Slot) -> TensorDescriptor<'a> {
        TensorDescriptor::new(
            self.input_name(slot.name()),
            slot.shape(),
            slot.lod(),
            slot.flat_values(),
        )
    }

    /// Encode every slot of a batch, in slot order.
    pub fn encode_batch<'a>(&self, batch: &'a Batch) -> Vec<TensorDescriptor<'a>> {
        batch.iter().map(|slot| self.encode_slot(slot)).collect()
    }

    /// Engine input names for every slot of a batch.
    pub fn input_names(&self, batch: &Batch) -> Vec<String> {
        batch.iter().map(|slot| self.input_name(slot.name())).collect()
    }
}
