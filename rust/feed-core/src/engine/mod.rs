// rust/feed-core/src/engine/mod.rs

//! The predictor surface batches are fed into.
//!
//! A predictor accepts inputs two ways: [`Predictor::run`] takes owned
//! tensors, while the zero-copy path writes straight into handles obtained
//! from [`Predictor::input_tensor`] and then calls
//! [`Predictor::zero_copy_run`].

use std::collections::BTreeMap;

use crate::error::Result;
use crate::tensor::OwnedTensor;

mod compare;
mod reference;

pub use compare::{check_deterministic, compare_outputs, compare_tensors};
pub use reference::{SeqPoolEngine, SEQPOOL_OUTPUT};

/// A predictor-owned input buffer the caller writes into directly.
pub trait ZeroCopyTensor {
    fn name(&self) -> &str;

    /// Set the shape; the buffer is resized to match.
    fn reshape(&mut self, shape: &[usize]);

    /// Set the LoD offset levels.
    fn set_lod(&mut self, lod: &[&[usize]]);

    fn shape(&self) -> &[usize];

    fn lod(&self) -> &[Vec<usize>];

    /// Writable view of the backing buffer, sized by the last `reshape`.
    fn buffer_mut(&mut self) -> &mut [f32];
}

/// A prediction engine.
pub trait Predictor: Send {
    /// Run on owned inputs and return owned outputs.
    ///
    /// # Errors
    ///
    /// Returns an engine error if an input is unknown, missing or
    /// inconsistent.
    fn run(&mut self, inputs: &[OwnedTensor]) -> Result<Vec<OwnedTensor>>;

    /// Names of the inputs this predictor expects.
    fn input_names(&self) -> Vec<String>;

    /// Names of the outputs produced by a run.
    fn output_names(&self) -> Vec<String>;

    /// Handle to a named input for the zero-copy path.
    fn input_tensor(&mut self, name: &str) -> Result<&mut dyn ZeroCopyTensor>;

    /// Run on the inputs previously written through [`input_tensor`].
    ///
    /// [`input_tensor`]: Predictor::input_tensor
    fn zero_copy_run(&mut self) -> Result<()>;

    /// Copy of a named output from the last zero-copy run.
    fn output(&self, name: &str) -> Result<OwnedTensor>;

    /// A fresh execution context with the same configuration, for use on
    /// another thread.
    fn try_clone(&self) -> Result<Box<dyn Predictor>>;

    /// Operator fusion statistics, keyed by fusion pass.
    fn fusion_stats(&self) -> BTreeMap<String, usize> {
        BTreeMap::new()
    }
}
