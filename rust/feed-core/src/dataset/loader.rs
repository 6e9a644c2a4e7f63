// rust/feed-core/src/dataset/loader.rs

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{SlotSchema, StorageConfig};
use crate::error::{FeedError, Result};
use crate::storage::{LocalStorage, StorageBackend};

use super::batch::{Batch, Slot};
use super::cursor::CyclicCursor;
use super::format::{DelimitedFormat, RecordFormat};

/// Per-name sample sequences, keyed in name order.
type SlotSamples = BTreeMap<String, Vec<Vec<f32>>>;

/// A fully loaded, pre-batched sequence dataset.
///
/// Loading and partitioning happen eagerly at construction, so a
/// `SequenceDataset` either exists and is structurally valid or was never
/// built. Batches are computed once; references returned by
/// [`next_batch`](Self::next_batch) point into the dataset and stay valid for
/// as long as it lives.
///
/// The batch cursor is plain mutable state behind `&mut self`. Workers that
/// pull batches concurrently each need their own dataset.
#[derive(Debug, Clone)]
pub struct SequenceDataset {
    schema: SlotSchema,
    batch_size: usize,
    num_samples: usize,
    names: Vec<String>,
    batches: Vec<Batch>,
    cursor: CyclicCursor,
}

impl SequenceDataset {
    /// Load `path` with the default schema and batch it.
    ///
    /// Relative paths are resolved against the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a line is malformed, or
    /// the records violate the schema.
    pub fn from_path(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        Self::from_path_with_schema(path, &SlotSchema::default(), batch_size)
    }

    /// Load `path` with an explicit schema and batch it.
    pub fn from_path_with_schema(
        path: impl AsRef<Path>,
        schema: &SlotSchema,
        batch_size: usize,
    ) -> Result<Self> {
        let storage = LocalStorage::new(&StorageConfig::default())?;
        Self::open(&storage, path.as_ref(), schema, batch_size)
    }

    /// Load a dataset through a storage backend.
    ///
    /// The object is read once and fully materialized; no handle is kept.
    pub fn open(
        storage: &dyn StorageBackend,
        path: &Path,
        schema: &SlotSchema,
        batch_size: usize,
    ) -> Result<Self> {
        let bytes = storage.open_read(path)?.read_all()?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| FeedError::storage(path, format!("dataset is not valid UTF-8: {e}")))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read dataset");
        Self::from_text(text, schema, batch_size)
    }

    /// Build a dataset from in-memory text using the schema's delimiters.
    pub fn from_text(text: &str, schema: &SlotSchema, batch_size: usize) -> Result<Self> {
        let format = DelimitedFormat::from_schema(schema);
        Self::from_text_with_format(text, &format, schema, batch_size)
    }

    /// Build a dataset from in-memory text with a custom record format.
    pub fn from_text_with_format(
        text: &str,
        format: &dyn RecordFormat,
        schema: &SlotSchema,
        batch_size: usize,
    ) -> Result<Self> {
        schema.validate()?;
        if batch_size == 0 {
            return Err(FeedError::config("batch_size must be greater than 0"));
        }

        let (samples, num_samples) = load(text, format, schema)?;
        let batches = partition(&samples, num_samples, batch_size, schema.group_width)?;

        if batches.is_empty() {
            tracing::warn!(
                batch_size,
                num_samples,
                "batch size exceeds sample count, dataset yields no batches"
            );
        } else if num_samples % batch_size != 0 {
            tracing::debug!(
                dropped = num_samples % batch_size,
                "trailing samples do not fill a batch and are skipped"
            );
        }

        tracing::debug!(
            format = format.name(),
            num_samples,
            num_names = samples.len(),
            num_batches = batches.len(),
            "dataset ready"
        );

        Ok(Self {
            schema: schema.clone(),
            batch_size,
            num_samples,
            names: samples.into_keys().collect(),
            cursor: CyclicCursor::new(batches.len()),
            batches,
        })
    }

    /// Advance the cyclic cursor and return the batch it lands on.
    ///
    /// After the last batch the cursor wraps back to the first, so this
    /// never runs out.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Capacity`] if the dataset has no batches.
    pub fn next_batch(&mut self) -> Result<&Batch> {
        match self.cursor.advance() {
            Some(index) => {
                if index == 0 && self.cursor.wraps() > 0 {
                    tracing::debug!(wraps = self.cursor.wraps(), "batch cursor wrapped");
                }
                Ok(&self.batches[index])
            }
            None => Err(FeedError::capacity(self.batch_size, self.num_samples)),
        }
    }

    /// Index of the batch last returned by [`next_batch`](Self::next_batch).
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.current_index()
    }

    /// Move the cursor back before the first batch.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Reports whether partitioning produced at least one batch.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Capacity`] when `batch_size > num_samples`.
    pub fn check_capacity(&self) -> Result<()> {
        if self.batches.is_empty() {
            return Err(FeedError::capacity(self.batch_size, self.num_samples));
        }
        Ok(())
    }

    pub fn schema(&self) -> &SlotSchema {
        &self.schema
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    /// Slot names in batch order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn batch(&self, index: usize) -> Option<&Batch> {
        self.batches.get(index)
    }
}

/// Parse every line into per-name samples and derive the sample count.
fn load(
    text: &str,
    format: &dyn RecordFormat,
    schema: &SlotSchema,
) -> Result<(SlotSamples, usize)> {
    let mut samples = SlotSamples::new();
    let mut num_lines = 0usize;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        num_lines += 1;

        let record = format.parse_record(line, line_no)?;
        if record.values.len() % schema.group_width != 0 {
            return Err(FeedError::slot_schema(
                record.name,
                format!(
                    "line {line_no}: {} values, not divisible by group width {}",
                    record.values.len(),
                    schema.group_width
                ),
            ));
        }

        samples.entry(record.name).or_default().push(record.values);
    }

    let num_samples = num_lines / schema.num_names;
    if num_samples * schema.num_names != num_lines {
        return Err(FeedError::schema(format!(
            "{num_lines} lines is not a multiple of {} names",
            schema.num_names
        )));
    }
    if num_samples == 0 {
        return Err(FeedError::schema("dataset contains no samples"));
    }

    Ok((samples, num_samples))
}

/// Split the samples into `num_samples / batch_size` batches.
///
/// Trailing samples that do not fill a whole batch are left out.
fn partition(
    samples: &SlotSamples,
    num_samples: usize,
    batch_size: usize,
    group_width: usize,
) -> Result<Vec<Batch>> {
    for (name, sequences) in samples {
        if sequences.len() != num_samples {
            return Err(FeedError::slot_schema(
                name,
                format!(
                    "{} samples, expected {num_samples} like every other slot",
                    sequences.len()
                ),
            ));
        }
    }

    let num_batches = num_samples / batch_size;
    let mut batches = Vec::with_capacity(num_batches);

    for index in 0..num_batches {
        let start = index * batch_size;
        let end = start + batch_size;

        let slots = samples
            .iter()
            .map(|(name, sequences)| Slot::build(name, &sequences[start..end], start, group_width))
            .collect::<Result<Vec<_>>>()?;

        batches.push(Batch::new(index, batch_size, slots));
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn values(groups: usize, width: usize, seed: usize) -> String {
        (0..groups * width)
            .map(|i| format!("{}", (seed * 1000 + i) as f32 / 10.0))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Writes `num_samples` samples for every name, sample `s` of name `n`
    /// holding `groups(n, s)` groups.
    fn dataset_text(
        names: &[&str],
        num_samples: usize,
        width: usize,
        groups: impl Fn(usize, usize) -> usize,
    ) -> String {
        let mut text = String::new();
        for s in 0..num_samples {
            for (n, name) in names.iter().enumerate() {
                writeln!(text, "{name}\t{}", values(groups(n, s), width, s)).unwrap();
            }
        }
        text
    }

    #[test]
    fn test_round_trip_two_names() {
        let text = format!(
            "A\t{}\nB\t{}\nA\t{}\nB\t{}\n",
            values(1, 11, 0),
            values(1, 11, 1),
            values(1, 11, 2),
            values(2, 11, 3),
        );
        let schema = SlotSchema::new(11, 2);
        let mut dataset = SequenceDataset::from_text(&text, &schema, 2).unwrap();

        assert_eq!(dataset.num_samples(), 2);
        assert_eq!(dataset.num_batches(), 1);
        assert_eq!(dataset.names(), &["A".to_string(), "B".to_string()]);

        let batch = dataset.next_batch().unwrap();
        let a = batch.slot("A").unwrap();
        assert_eq!(a.lod(), &[0, 1, 2]);
        assert_eq!(a.shape(), [2, 11]);

        let b = batch.slot("B").unwrap();
        assert_eq!(b.lod(), &[0, 1, 3]);
        assert_eq!(b.shape(), [3, 11]);
        assert_eq!(b.flat_values().len(), 33);
    }

    #[test]
    fn test_line_schema_sample_count() {
        let schema = SlotSchema::new(3, 4);
        for k in 1..=5 {
            let text = dataset_text(&["a", "b", "c", "d"], k, 3, |n, s| (n + s) % 3);
            let dataset = SequenceDataset::from_text(&text, &schema, 1).unwrap();
            assert_eq!(dataset.num_samples(), k);
            assert_eq!(dataset.num_batches(), k);
        }
    }

    #[test]
    fn test_slots_follow_name_order() {
        let text = dataset_text(&["zeta", "alpha", "mid"], 2, 2, |_, _| 1);
        let schema = SlotSchema::new(2, 3);
        let dataset = SequenceDataset::from_text(&text, &schema, 1).unwrap();

        let names: Vec<_> = dataset.batches()[0].iter().map(Slot::name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_batches_use_consecutive_samples() {
        let text = dataset_text(&["a"], 4, 2, |_, s| s + 1);
        let schema = SlotSchema::new(2, 1);
        let dataset = SequenceDataset::from_text(&text, &schema, 2).unwrap();

        assert_eq!(dataset.batches()[0].slot("a").unwrap().lod(), &[0, 1, 3]);
        assert_eq!(dataset.batches()[1].slot("a").unwrap().lod(), &[0, 3, 7]);

        // First value of sample 2 lands at the start of batch 1
        let first = dataset.batches()[1].slot("a").unwrap().flat_values()[0];
        assert_eq!(first, 200.0);
    }

    #[test]
    fn test_truncates_trailing_samples() {
        let text = dataset_text(&["a", "b"], 7, 11, |_, _| 1);
        let schema = SlotSchema::new(11, 2);
        let dataset = SequenceDataset::from_text(&text, &schema, 3).unwrap();

        assert_eq!(dataset.num_samples(), 7);
        assert_eq!(dataset.num_batches(), 2);
    }

    #[test]
    fn test_cyclic_iteration_wraps() {
        let text = dataset_text(&["a", "b"], 6, 2, |n, s| n + s);
        let schema = SlotSchema::new(2, 2);
        let mut dataset = SequenceDataset::from_text(&text, &schema, 2).unwrap();
        assert_eq!(dataset.num_batches(), 3);

        let first = dataset.next_batch().unwrap().clone();
        assert_eq!(dataset.current_index(), Some(0));
        dataset.next_batch().unwrap();
        dataset.next_batch().unwrap();
        assert_eq!(dataset.current_index(), Some(2));

        let wrapped = dataset.next_batch().unwrap();
        assert_eq!(wrapped, &first);
        assert_eq!(dataset.current_index(), Some(0));

        dataset.reset();
        assert_eq!(dataset.current_index(), None);
        assert_eq!(dataset.next_batch().unwrap().index(), 0);
    }

    #[test]
    fn test_lod_invariants_hold_for_every_slot() {
        let text = dataset_text(&["a", "b", "c"], 9, 5, |n, s| (n * 7 + s * 3) % 4);
        let schema = SlotSchema::new(5, 3);
        let dataset = SequenceDataset::from_text(&text, &schema, 4).unwrap();

        for batch in dataset.batches() {
            for slot in batch {
                let lod = slot.lod();
                assert_eq!(lod.len(), 5);
                assert_eq!(lod[0], 0);
                assert!(lod.windows(2).all(|w| w[0] <= w[1]));
                assert_eq!(slot.shape(), [lod[4], 5]);
                assert_eq!(slot.flat_values().len(), 5 * lod[4]);
            }
        }
    }

    #[test]
    fn test_rejects_indivisible_sequence() {
        let text = format!("a\t{}\nb\t{}\n", values(1, 11, 0), "1 2 3 4 5 6 7 8 9 10");
        let schema = SlotSchema::new(11, 2);
        let err = SequenceDataset::from_text(&text, &schema, 1).unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, FeedError::Schema { .. }));
        assert!(msg.contains("line 2"));
        assert!(msg.contains("'b'"));
    }

    #[test]
    fn test_rejects_line_count_not_multiple_of_names() {
        let text = dataset_text(&["a", "b", "c"], 2, 1, |_, _| 1);
        let schema = SlotSchema::new(1, 4);
        let err = SequenceDataset::from_text(&text, &schema, 1).unwrap_err();
        assert!(err.to_string().contains("not a multiple of 4 names"));
    }

    #[test]
    fn test_rejects_empty_dataset() {
        let schema = SlotSchema::new(11, 2);
        let err = SequenceDataset::from_text("", &schema, 1).unwrap_err();
        assert!(err.to_string().contains("no samples"));
    }

    #[test]
    fn test_rejects_unequal_slot_counts() {
        // 4 lines, 2 names expected, but 'a' appears 3 times
        let text = "a\t1\na\t2\nb\t3\na\t4\n";
        let schema = SlotSchema::new(1, 2);
        let err = SequenceDataset::from_text(text, &schema, 1).unwrap_err();

        assert!(matches!(err, FeedError::Schema { slot: Some(_), .. }));
    }

    #[test]
    fn test_rejects_malformed_line() {
        let text = "a\t1 2\nb 3 4\n";
        let schema = SlotSchema::new(1, 2);
        let err = SequenceDataset::from_text(text, &schema, 1).unwrap_err();
        assert!(matches!(err, FeedError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let text = dataset_text(&["a"], 2, 1, |_, _| 1);
        let schema = SlotSchema::new(1, 1);
        let err = SequenceDataset::from_text(&text, &schema, 0).unwrap_err();
        assert!(matches!(err, FeedError::Config { .. }));
    }

    #[test]
    fn test_batch_size_larger_than_samples() {
        let text = dataset_text(&["a", "b"], 3, 2, |_, _| 1);
        let schema = SlotSchema::new(2, 2);
        let mut dataset = SequenceDataset::from_text(&text, &schema, 4).unwrap();

        assert_eq!(dataset.num_batches(), 0);

        let err = dataset.check_capacity().unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(
            dataset.next_batch(),
            Err(FeedError::Capacity { batch_size: 4, num_samples: 3 })
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", dataset_text(&["q", "t"], 4, 11, |n, _| n + 1)).unwrap();

        let schema = SlotSchema::new(11, 2);
        let dataset = SequenceDataset::from_path_with_schema(file.path(), &schema, 2).unwrap();

        assert_eq!(dataset.num_samples(), 4);
        assert_eq!(dataset.num_batches(), 2);
        assert_eq!(dataset.batch(1).unwrap().slot("t").unwrap().shape(), [4, 11]);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SequenceDataset::from_path("/nonexistent/seqfeed/data.txt", 1).unwrap_err();
        assert!(matches!(err, FeedError::Storage { .. }));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a\t1\xff\n").unwrap();
        file.flush().unwrap();

        let schema = SlotSchema::new(1, 1);
        let err = SequenceDataset::from_path_with_schema(file.path(), &schema, 1).unwrap_err();
        assert!(matches!(err, FeedError::Storage { .. }));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_crlf_lines() {
        let text = "a\t1 2\r\nb\t3 4\r\n";
        let schema = SlotSchema::new(2, 2);
        let dataset = SequenceDataset::from_text(text, &schema, 1).unwrap();
        assert_eq!(dataset.batches()[0].slot("b").unwrap().flat_values(), &[3.0, 4.0]);
    }
}
