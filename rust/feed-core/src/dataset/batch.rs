// rust/feed-core/src/dataset/batch.rs

use crate::error::{FeedError, Result};

/// One named input of a batch: the batch's sequences for that name,
/// flattened, plus the offsets that mark where each sequence starts.
///
/// Invariants, established by [`Slot::build`]:
/// - `lod.len() == batch_size + 1`, `lod[0] == 0`, `lod` is non-decreasing
/// - `shape == [lod[batch_size], group_width]`
/// - `flat_values.len() == shape[0] * shape[1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    name: String,
    flat_values: Vec<f32>,
    lod: Vec<usize>,
    shape: [usize; 2],
}

impl Slot {
    /// Builds a slot from consecutive samples of one name.
    ///
    /// `first_sample` is the dataset index of `samples[0]` and is only used
    /// in error messages.
    ///
    /// # Errors
    ///
    /// Returns a schema error if a sample length is not a multiple of
    /// `group_width`.
    pub fn build(
        name: &str,
        samples: &[Vec<f32>],
        first_sample: usize,
        group_width: usize,
    ) -> Result<Self> {
        if group_width == 0 {
            return Err(FeedError::config("group width must be greater than 0"));
        }

        let total_values: usize = samples.iter().map(Vec::len).sum();
        let mut flat_values = Vec::with_capacity(total_values);
        let mut lod = Vec::with_capacity(samples.len() + 1);
        lod.push(0);

        for (k, sample) in samples.iter().enumerate() {
            let groups = sample.len() / group_width;
            if groups * group_width != sample.len() {
                return Err(FeedError::slot_schema(
                    name,
                    format!(
                        "sample {} has {} values, not divisible by group width {}",
                        first_sample + k,
                        sample.len(),
                        group_width
                    ),
                ));
            }

            flat_values.extend_from_slice(sample);
            let last = lod[lod.len() - 1];
            lod.push(last + groups);
        }

        let total_groups = lod[lod.len() - 1];
        Ok(Self {
            name: name.to_string(),
            flat_values,
            lod,
            shape: [total_groups, group_width],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values of the batch for this name, in sample order.
    pub fn flat_values(&self) -> &[f32] {
        &self.flat_values
    }

    /// Cumulative group offsets, one more entry than there are sequences.
    pub fn lod(&self) -> &[usize] {
        &self.lod
    }

    /// `[total_groups, group_width]`
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    pub fn group_width(&self) -> usize {
        self.shape[1]
    }

    pub fn num_sequences(&self) -> usize {
        self.lod.len() - 1
    }
}

/// A fixed-size group of samples, one [`Slot`] per name in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    index: usize,
    batch_size: usize,
    slots: Vec<Slot>,
}

impl Batch {
    pub(crate) fn new(index: usize, batch_size: usize, slots: Vec<Slot>) -> Self {
        Self {
            index,
            batch_size,
            slots,
        }
    }

    /// Position of this batch within the dataset.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of samples in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
