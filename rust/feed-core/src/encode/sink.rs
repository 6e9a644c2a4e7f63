// rust/feed-core/src/encode/sink.rs

//! Delivery of encoded tensors to a predictor.
//!
//! [`CopySink`] collects owned copies for [`Predictor::run`];
//! [`ZeroCopySink`] writes into the predictor's own input buffers for
//! [`Predictor::zero_copy_run`]. Both consume the same descriptors, so the
//! encoding step is shared.

use super::encoder::BatchEncoder;
use crate::dataset::Batch;
use crate::engine::Predictor;
use crate::error::{FeedError, Result};
use crate::tensor::{OwnedTensor, TensorDescriptor};

/// Something that accepts encoded tensors.
pub trait InputSink {
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the tensor.
    fn feed(&mut self, tensor: &TensorDescriptor<'_>) -> Result<()>;
}

/// Encode every slot of `batch` and feed it to `sink`.
///
/// Returns the number of tensors fed.
pub fn feed_batch<S: InputSink + ?Sized>(
    encoder: &BatchEncoder,
    batch: &Batch,
    sink: &mut S,
) -> Result<usize> {
    let mut fed = 0;
    for slot in batch {
        sink.feed(&encoder.encode_slot(slot))?;
        fed += 1;
    }
    Ok(fed)
}

/// Copies each tensor into an owned input.
#[derive(Debug, Default)]
pub struct CopySink {
    inputs: Vec<OwnedTensor>,
}

impl CopySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> &[OwnedTensor] {
        &self.inputs
    }

    pub fn into_inputs(self) -> Vec<OwnedTensor> {
        self.inputs
    }

    pub fn clear(&mut self) {
        self.inputs.clear();
    }
}

impl InputSink for CopySink {
    fn feed(&mut self, tensor: &TensorDescriptor<'_>) -> Result<()> {
        self.inputs.push(tensor.to_owned_tensor());
        Ok(())
    }
}

/// Writes each tensor straight into the predictor's named input handle.
pub struct ZeroCopySink<'p, P: Predictor + ?Sized> {
    predictor: &'p mut P,
    fed: usize,
}

impl<'p, P: Predictor + ?Sized> ZeroCopySink<'p, P> {
    pub fn new(predictor: &'p mut P) -> Self {
        Self { predictor, fed: 0 }
    }

    /// Number of tensors written so far.
    pub fn fed(&self) -> usize {
        self.fed
    }
}

impl<P: Predictor + ?Sized> InputSink for ZeroCopySink<'_, P> {
    fn feed(&mut self, tensor: &TensorDescriptor<'_>) -> Result<()> {
        let handle = self.predictor.input_tensor(tensor.name())?;
        handle.reshape(tensor.shape());
        handle.set_lod(tensor.lod());

        let buffer = handle.buffer_mut();
        if buffer.len() != tensor.data().len() {
            return Err(FeedError::engine(format!(
                "input '{}' buffer holds {} values after reshape, need {}",
                tensor.name(),
                buffer.len(),
                tensor.data().len()
            )));
        }
        buffer.copy_from_slice(tensor.data());

        tracing::trace!(
            input = tensor.name(),
            bytes = tensor.byte_len(),
            "wrote zero-copy input"
        );
        self.fed += 1;
        Ok(())
    }
}

/// Feed `batch` through the copying path and run the predictor.
pub fn run_copy_path<P: Predictor + ?Sized>(
    predictor: &mut P,
    encoder: &BatchEncoder,
    batch: &Batch,
) -> Result<Vec<OwnedTensor>> {
    let mut sink = CopySink::new();
    feed_batch(encoder, batch, &mut sink)?;
    predictor.run(sink.inputs())
}

/// Feed `batch` through the zero-copy path and run the predictor.
///
/// Outputs are read back with [`Predictor::output`].
pub fn run_zero_copy_path<P: Predictor + ?Sized>(
    predictor: &mut P,
    encoder: &BatchEncoder,
    batch: &Batch,
) -> Result<()> {
    let mut sink = ZeroCopySink::new(&mut *predictor);
    feed_batch(encoder, batch, &mut sink)?;
    predictor.zero_copy_run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotSchema;
    use crate::dataset::SequenceDataset;
    use crate::engine::{compare_outputs, SeqPoolEngine, SEQPOOL_OUTPUT};
    use crate::tensor::DType;

    fn sample_dataset() -> SequenceDataset {
        let mut text = String::new();
        for s in 0..6 {
            for (n, name) in ["query", "title", "url"].iter().enumerate() {
                let groups = (s + n) % 3 + 1;
                let values: Vec<String> = (0..groups * 11)
                    .map(|i| format!("{:.3}", ((s * 31 + n * 7 + i) % 17) as f32 * 0.173))
                    .collect();
                text.push_str(&format!("{name}\t{}\n", values.join(" ")));
            }
        }
        SequenceDataset::from_text(&text, &SlotSchema::new(11, 3), 2).unwrap()
    }

    fn engine_for(dataset: &SequenceDataset, encoder: &BatchEncoder) -> SeqPoolEngine {
        SeqPoolEngine::new(dataset.names().iter().map(|n| encoder.input_name(n))).unwrap()
    }

    #[test]
    fn test_copy_sink_owns_inputs() {
        let dataset = sample_dataset();
        let encoder = BatchEncoder::default();
        let batch = &dataset.batches()[0];

        let mut sink = CopySink::new();
        assert_eq!(feed_batch(&encoder, batch, &mut sink).unwrap(), 3);

        let inputs = sink.into_inputs();
        assert_eq!(inputs.len(), 3);
        for (input, slot) in inputs.iter().zip(batch) {
            assert_eq!(input.name, format!("{}_embed", slot.name()));
            assert_eq!(input.dtype, DType::Float32);
            assert_eq!(input.lod, vec![slot.lod().to_vec()]);
            assert_eq!(input.data, slot.flat_values());
            assert!(input.validate().is_ok());
        }
    }

    #[test]
    fn test_zero_copy_sink_fills_handles() {
        let dataset = sample_dataset();
        let encoder = BatchEncoder::default();
        let batch = &dataset.batches()[1];
        let mut engine = engine_for(&dataset, &encoder);

        let mut sink = ZeroCopySink::new(&mut engine);
        feed_batch(&encoder, batch, &mut sink).unwrap();
        assert_eq!(sink.fed(), 3);

        let slot = batch.slot("title").unwrap();
        let handle = engine.input_tensor("title_embed").unwrap();
        assert_eq!(handle.shape(), &slot.shape()[..]);
        assert_eq!(handle.lod(), &[slot.lod().to_vec()]);
        assert_eq!(handle.buffer_mut(), slot.flat_values());
    }

    #[test]
    fn test_zero_copy_sink_unknown_input() {
        let dataset = sample_dataset();
        let mut engine = SeqPoolEngine::new(["query_embed"]).unwrap();
        let mut sink = ZeroCopySink::new(&mut engine);

        let err = feed_batch(&BatchEncoder::default(), &dataset.batches()[0], &mut sink);
        assert!(err.is_err());
    }

    #[test]
    fn test_copy_and_zero_copy_paths_agree() {
        let mut dataset = sample_dataset();
        let encoder = BatchEncoder::default();
        let mut engine = engine_for(&dataset, &encoder);

        for _ in 0..dataset.num_batches() {
            let batch = dataset.next_batch().unwrap();

            let copied = run_copy_path(&mut engine, &encoder, batch).unwrap();
            run_zero_copy_path(&mut engine, &encoder, batch).unwrap();
            let zero_copy = engine.output(SEQPOOL_OUTPUT).unwrap();

            assert_eq!(copied.len(), 1);
            assert_eq!(copied[0].shape, zero_copy.shape);
            compare_outputs(&copied[0].data, &zero_copy.data, 1e-3).unwrap();
        }
    }

    #[test]
    fn test_paths_work_through_trait_objects() {
        let dataset = sample_dataset();
        let encoder = BatchEncoder::default();
        let engine = engine_for(&dataset, &encoder);
        let mut boxed: Box<dyn Predictor> = engine.try_clone().unwrap();

        let batch = &dataset.batches()[2];
        let copied = run_copy_path(boxed.as_mut(), &encoder, batch).unwrap();
        run_zero_copy_path(boxed.as_mut(), &encoder, batch).unwrap();

        let zero_copy = boxed.output(SEQPOOL_OUTPUT).unwrap();
        assert_eq!(copied[0], zero_copy);
    }
}
