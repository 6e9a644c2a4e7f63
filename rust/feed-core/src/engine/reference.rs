// rust/feed-core/src/engine/reference.rs

//! A small deterministic predictor.
//!
//! Every input sequence is sum-pooled over its rows, the pooled inputs are
//! concatenated in declaration order and each sample's row is reduced to a
//! single value. Both feeding paths share one forward pass, which makes the
//! engine a convenient yardstick for comparing them.

use std::collections::BTreeMap;

use super::{Predictor, ZeroCopyTensor};
use crate::error::{FeedError, Result};
use crate::tensor::OwnedTensor;

/// Name of the single output produced by [`SeqPoolEngine`].
pub const SEQPOOL_OUTPUT: &str = "reduce_sum_0.tmp_0";

/// Borrowed view of one input, whichever path it arrived on.
struct InputView<'a> {
    name: &'a str,
    shape: &'a [usize],
    lod: &'a [Vec<usize>],
    data: &'a [f32],
}

/// Sequence sum-pool predictor.
#[derive(Debug)]
pub struct SeqPoolEngine {
    input_names: Vec<String>,
    handles: BTreeMap<String, InputHandle>,
    outputs: BTreeMap<String, OwnedTensor>,
}

impl SeqPoolEngine {
    /// Creates an engine expecting the given inputs.
    ///
    /// # Errors
    ///
    /// Returns an engine error if no inputs are given or a name repeats.
    pub fn new<I, S>(input_names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let input_names: Vec<String> = input_names.into_iter().map(Into::into).collect();
        if input_names.is_empty() {
            return Err(FeedError::engine("engine needs at least one input"));
        }

        let mut handles = BTreeMap::new();
        for name in &input_names {
            if handles.insert(name.clone(), InputHandle::new(name)).is_some() {
                return Err(FeedError::engine(format!("duplicate input '{name}'")));
            }
        }

        Ok(Self {
            input_names,
            handles,
            outputs: BTreeMap::new(),
        })
    }

    fn forward(&self, inputs: &[InputView<'_>]) -> Result<OwnedTensor> {
        let mut batch_size = None;
        let mut totals: Vec<f32> = Vec::new();

        for name in &self.input_names {
            let input = inputs
                .iter()
                .find(|input| input.name == name.as_str())
                .ok_or_else(|| FeedError::engine(format!("input '{name}' was not provided")))?;

            let (rows, width) = match input.shape {
                [rows, width] => (*rows, *width),
                other => {
                    return Err(FeedError::engine(format!(
                        "input '{name}' must be 2-D, got shape {other:?}"
                    )))
                }
            };
            if width == 0 {
                return Err(FeedError::engine(format!(
                    "input '{name}' has zero-width rows"
                )));
            }
            if input.data.len() != rows * width {
                return Err(FeedError::engine(format!(
                    "input '{name}' holds {} values but shape is [{rows}, {width}]",
                    input.data.len()
                )));
            }

            let lod = match input.lod.last() {
                Some(level) if level.first() == Some(&0) && level.last() == Some(&rows) => level,
                _ => {
                    return Err(FeedError::engine(format!(
                        "input '{name}' lod must run from 0 to {rows}"
                    )))
                }
            };
            if lod.windows(2).any(|w| w[0] > w[1]) {
                return Err(FeedError::engine(format!(
                    "input '{name}' lod is not non-decreasing"
                )));
            }
            let sequences = lod.len() - 1;

            match batch_size {
                None => {
                    batch_size = Some(sequences);
                    totals = vec![0.0; sequences];
                }
                Some(expected) if expected != sequences => {
                    return Err(FeedError::engine(format!(
                        "input '{name}' has {sequences} sequences, expected {expected}"
                    )))
                }
                Some(_) => {}
            }

            for (k, bounds) in lod.windows(2).enumerate() {
                let sequence = &input.data[bounds[0] * width..bounds[1] * width];
                totals[k] += pool_and_reduce(sequence, width);
            }
        }

        let batch_size = batch_size.unwrap_or(0);
        Ok(OwnedTensor::new(SEQPOOL_OUTPUT, vec![batch_size, 1], totals))
    }
}

/// Sum-pool `rows` column-wise, then reduce the pooled row to one value.
fn pool_and_reduce(rows: &[f32], width: usize) -> f32 {
    let mut pooled = vec![0.0f32; width];
    for row in rows.chunks_exact(width) {
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
    }
    pooled.iter().sum()
}

impl Predictor for SeqPoolEngine {
    fn run(&mut self, inputs: &[OwnedTensor]) -> Result<Vec<OwnedTensor>> {
        if let Some(unknown) = inputs.iter().find(|t| !self.handles.contains_key(&t.name)) {
            return Err(FeedError::engine(format!("unknown input '{}'", unknown.name)));
        }

        let views: Vec<_> = inputs
            .iter()
            .map(|t| InputView {
                name: &t.name,
                shape: &t.shape,
                lod: &t.lod,
                data: &t.data,
            })
            .collect();

        Ok(vec![self.forward(&views)?])
    }

    fn input_names(&self) -> Vec<String> {
        self.input_names.clone()
    }

    fn output_names(&self) -> Vec<String> {
        vec![SEQPOOL_OUTPUT.to_string()]
    }

    fn input_tensor(&mut self, name: &str) -> Result<&mut dyn ZeroCopyTensor> {
        match self.handles.get_mut(name) {
            Some(handle) => Ok(handle as &mut dyn ZeroCopyTensor),
            None => Err(FeedError::engine(format!("unknown input '{name}'"))),
        }
    }

    fn zero_copy_run(&mut self) -> Result<()> {
        let views: Vec<_> = self
            .handles
            .values()
            .filter(|h| h.written)
            .map(|h| InputView {
                name: &h.name,
                shape: &h.shape,
                lod: &h.lod,
                data: &h.data,
            })
            .collect();

        let output = self.forward(&views)?;
        self.outputs.insert(output.name.clone(), output);
        Ok(())
    }

    fn output(&self, name: &str) -> Result<OwnedTensor> {
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| FeedError::engine(format!("output '{name}' is not available")))
    }

    fn try_clone(&self) -> Result<Box<dyn Predictor>> {
        Ok(Box::new(Self::new(self.input_names.clone())?))
    }

    fn fusion_stats(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([("seqpool_reduce_fuse".to_string(), self.input_names.len())])
    }
}

#[derive(Debug)]
struct InputHandle {
    name: String,
    shape: Vec<usize>,
    lod: Vec<Vec<usize>>,
    data: Vec<f32>,
    written: bool,
}

impl InputHandle {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shape: Vec::new(),
            lod: Vec::new(),
            data: Vec::new(),
            written: false,
        }
    }
}

impl ZeroCopyTensor for InputHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn reshape(&mut self, shape: &[usize]) {
        self.shape = shape.to_vec();
        self.data.resize(shape.iter().product(), 0.0);
        self.written = true;
    }

    fn set_lod(&mut self, lod: &[&[usize]]) {
        self.lod = lod.iter().map(|level| level.to_vec()).collect();
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn lod(&self) -> &[Vec<usize>] {
        &self.lod
    }

    fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
