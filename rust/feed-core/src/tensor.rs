// rust/feed-core/src/tensor.rs

//! Tensor representations exchanged with a predictor.

use crate::error::{FeedError, Result};

/// Element type of a tensor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Float32,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::Float32 => std::mem::size_of::<f32>(),
        }
    }
}

/// An encoded slot, ready to be handed to a predictor.
///
/// The data buffer borrows the slot's values; nothing is copied until a sink
/// decides to.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorDescriptor<'a> {
    name: String,
    shape: [usize; 2],
    dtype: DType,
    lod: [&'a [usize]; 1],
    data: &'a [f32],
}

impl<'a> TensorDescriptor<'a> {
    pub(crate) fn new(name: String, shape: [usize; 2], lod: &'a [usize], data: &'a [f32]) -> Self {
        Self {
            name,
            shape,
            dtype: DType::Float32,
            lod: [lod],
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// LoD levels; always exactly one.
    pub fn lod(&self) -> &[&'a [usize]] {
        &self.lod
    }

    /// Contiguous row-major values over `shape`.
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len() * self.dtype.size_of()
    }

    /// Copy the descriptor into an owned tensor.
    pub fn to_owned_tensor(&self) -> OwnedTensor {
        OwnedTensor {
            name: self.name.clone(),
            shape: self.shape.to_vec(),
            dtype: self.dtype,
            lod: self.lod.iter().map(|level| level.to_vec()).collect(),
            data: self.data.to_vec(),
        }
    }
}

/// A tensor that owns its buffers.
///
/// Used for inputs on the copying path and for predictor outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub lod: Vec<Vec<usize>>,
    pub data: Vec<f32>,
}

impl OwnedTensor {
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            shape,
            dtype: DType::Float32,
            lod: Vec::new(),
            data,
        }
    }

    #[must_use]
    pub fn with_lod(mut self, lod: Vec<Vec<usize>>) -> Self {
        self.lod = lod;
        self
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check that the buffer matches the shape and every LoD level is a
    /// valid offset table whose innermost level ends at `shape[0]`.
    ///
    /// # Errors
    ///
    /// Returns an engine error describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.numel() {
            return Err(FeedError::engine(format!(
                "tensor '{}' holds {} values but shape {:?} needs {}",
                self.name,
                self.data.len(),
                self.shape,
                self.numel()
            )));
        }

        for (depth, level) in self.lod.iter().enumerate() {
            if level.first() != Some(&0) {
                return Err(FeedError::engine(format!(
                    "tensor '{}' lod level {depth} must start at 0",
                    self.name
                )));
            }
            if level.windows(2).any(|w| w[0] > w[1]) {
                return Err(FeedError::engine(format!(
                    "tensor '{}' lod level {depth} is not non-decreasing",
                    self.name
                )));
            }
        }

        if let Some(innermost) = self.lod.last() {
            let rows = self.shape.first().copied().unwrap_or(0);
            if innermost.last() != Some(&rows) {
                return Err(FeedError::engine(format!(
                    "tensor '{}' lod ends at {:?} but has {rows} rows",
                    self.name,
                    innermost.last()
                )));
            }
        }

        Ok(())
    }
}
