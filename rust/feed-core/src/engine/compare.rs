// rust/feed-core/src/engine/compare.rs

use super::Predictor;
use crate::error::{FeedError, Result};
use crate::tensor::OwnedTensor;

/// Compare two output buffers element-wise within `tolerance`.
///
/// Two NaNs compare equal; a NaN against a number does not.
///
/// # Errors
///
/// Returns an engine error on a length mismatch and
/// [`FeedError::OutputMismatch`] for the first element out of tolerance.
pub fn compare_outputs(expected: &[f32], actual: &[f32], tolerance: f32) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(FeedError::engine(format!(
            "output length mismatch: expected {}, got {}",
            expected.len(),
            actual.len()
        )));
    }

    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        let within = if e.is_nan() || a.is_nan() {
            e.is_nan() && a.is_nan()
        } else {
            (e - a).abs() <= tolerance
        };
        if !within {
            return Err(FeedError::mismatch(index, e, a, tolerance));
        }
    }

    Ok(())
}

/// Compare two sets of output tensors by name, shape and data.
pub fn compare_tensors(
    expected: &[OwnedTensor],
    actual: &[OwnedTensor],
    tolerance: f32,
) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(FeedError::engine(format!(
            "expected {} outputs, got {}",
            expected.len(),
            actual.len()
        )));
    }

    for (e, a) in expected.iter().zip(actual) {
        if e.name != a.name {
            return Err(FeedError::engine(format!(
                "output name mismatch: expected '{}', got '{}'",
                e.name, a.name
            )));
        }
        if e.shape != a.shape {
            return Err(FeedError::engine(format!(
                "output '{}' shape mismatch: expected {:?}, got {:?}",
                e.name, e.shape, a.shape
            )));
        }
        compare_outputs(&e.data, &a.data, tolerance)?;
    }

    Ok(())
}

/// Run every input set `repeats` times and check each run reproduces the
/// first one.
pub fn check_deterministic(
    predictor: &mut dyn Predictor,
    input_sets: &[Vec<OwnedTensor>],
    repeats: usize,
    tolerance: f32,
) -> Result<()> {
    for (set, inputs) in input_sets.iter().enumerate() {
        let baseline = predictor.run(inputs)?;
        for run in 1..repeats {
            let outputs = predictor.run(inputs)?;
            compare_tensors(&baseline, &outputs, tolerance).map_err(|e| {
                tracing::warn!(set, run, error = %e, "predictor is not deterministic");
                e
            })?;
        }
    }
    Ok(())
}
