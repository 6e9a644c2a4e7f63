// rust/feed-bench/src/profile.rs

//! Timed runs of a predictor over batches from a sequence dataset.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use seqfeed_core::encode::{run_copy_path, run_zero_copy_path, CopySink};
use seqfeed_core::engine::{check_deterministic, compare_tensors};
use seqfeed_core::{
    feed_batch, BatchEncoder, FeedError, FeedRuntime, OwnedTensor, Predictor, Result,
    SeqPoolEngine, SequenceDataset,
};

/// Tolerance used when comparing outputs of the two feeding paths.
pub const COMPARE_TOLERANCE: f32 = 1e-3;

/// Options shared by every bench mode.
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub batch_size: usize,
    pub num_threads: usize,
    pub repeat: usize,
    pub test_all_data: bool,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            num_threads: 1,
            repeat: 1,
            test_all_data: false,
        }
    }
}

impl BenchOptions {
    /// Batches fed per repeat: one, or every batch in the dataset.
    fn batches_per_repeat(&self, dataset: &SequenceDataset) -> usize {
        if self.test_all_data {
            dataset.num_batches()
        } else {
            1
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub num_samples: usize,
    pub num_runs: usize,
    pub mean_latency: Duration,
}

#[derive(Debug, Clone)]
pub struct ThreadReport {
    pub thread: usize,
    pub num_runs: usize,
    pub elapsed: Duration,
}

impl ThreadReport {
    pub fn mean_latency(&self) -> Duration {
        mean(self.elapsed, self.num_runs)
    }
}

#[derive(Debug, Clone)]
pub struct CompareReport {
    pub batches_compared: usize,
}

fn mean(total: Duration, runs: usize) -> Duration {
    u32::try_from(runs)
        .ok()
        .filter(|&runs| runs > 0)
        .map_or(Duration::ZERO, |runs| total / runs)
}

fn load(runtime: &FeedRuntime, data: &Path, options: &BenchOptions) -> Result<SequenceDataset> {
    let dataset = runtime.load_dataset_with_batch_size(data, options.batch_size)?;
    dataset.check_capacity()?;
    Ok(dataset)
}

/// A predictor whose inputs are the dataset's slot names.
pub fn build_engine(dataset: &SequenceDataset, encoder: &BatchEncoder) -> Result<SeqPoolEngine> {
    SeqPoolEngine::new(dataset.names().iter().map(|name| encoder.input_name(name)))
}

/// Time the copying path.
pub fn profile(
    runtime: &FeedRuntime,
    data: &Path,
    options: &BenchOptions,
) -> Result<ProfileReport> {
    let mut dataset = load(runtime, data, options)?;
    let encoder = runtime.encoder();
    let mut engine = build_engine(&dataset, &encoder)?;

    let batches = options.batches_per_repeat(&dataset);
    let mut num_runs = 0;
    let mut elapsed = Duration::ZERO;

    for _ in 0..options.repeat {
        for _ in 0..batches {
            let batch = dataset.next_batch()?;
            let start = Instant::now();
            run_copy_path(&mut engine, &encoder, batch)?;
            elapsed += start.elapsed();
            num_runs += 1;
        }
    }

    let report = ProfileReport {
        num_samples: batches * dataset.batch_size(),
        num_runs,
        mean_latency: mean(elapsed, num_runs),
    };

    tracing::info!(
        num_samples = report.num_samples,
        runs = report.num_runs,
        "mean latency {:.3} ms",
        report.mean_latency.as_secs_f64() * 1000.0
    );

    Ok(report)
}

/// Time the zero-copy path on `num_threads` workers.
///
/// Each worker owns a clone of the predictor and its own dataset, runs one
/// warm-up batch and then `repeat` timed passes.
pub fn zero_copy(
    runtime: &FeedRuntime,
    data: &Path,
    options: &BenchOptions,
) -> Result<Vec<ThreadReport>> {
    let probe = load(runtime, data, options)?;
    let encoder = runtime.encoder();
    let base = build_engine(&probe, &encoder)?;
    drop(probe);

    let num_threads = options.num_threads.max(1);
    let mut predictors = Vec::with_capacity(num_threads);
    for _ in 0..num_threads {
        predictors.push(base.try_clone()?);
    }

    let reports = thread::scope(|scope| {
        let handles: Vec<_> = predictors
            .into_iter()
            .enumerate()
            .map(|(thread, predictor)| {
                let encoder = &encoder;
                scope.spawn(move || {
                    zero_copy_worker(thread, predictor, runtime, data, encoder, options)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(FeedError::engine("zero-copy worker panicked")))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let total: Duration = reports.iter().map(ThreadReport::mean_latency).sum();
    tracing::info!(
        threads = reports.len(),
        "average latency {:.3} ms",
        mean(total, reports.len()).as_secs_f64() * 1000.0
    );

    Ok(reports)
}

fn zero_copy_worker(
    thread: usize,
    mut predictor: Box<dyn Predictor>,
    runtime: &FeedRuntime,
    data: &Path,
    encoder: &BatchEncoder,
    options: &BenchOptions,
) -> Result<ThreadReport> {
    let mut dataset = load(runtime, data, options)?;
    let batches = options.batches_per_repeat(&dataset);

    // Warm-up
    let batch = dataset.next_batch()?;
    run_zero_copy_path(predictor.as_mut(), encoder, batch)?;
    dataset.reset();

    let mut num_runs = 0;
    let start = Instant::now();
    for _ in 0..options.repeat {
        for _ in 0..batches {
            let batch = dataset.next_batch()?;
            run_zero_copy_path(predictor.as_mut(), encoder, batch)?;
            num_runs += 1;
        }
    }

    let report = ThreadReport {
        thread,
        num_runs,
        elapsed: start.elapsed(),
    };

    tracing::info!(
        thread,
        runs = num_runs,
        "thread latency {:.3} ms",
        report.mean_latency().as_secs_f64() * 1000.0
    );

    Ok(report)
}

/// Compare copying and zero-copy outputs batch by batch, then check the
/// copying path is deterministic across repeats.
pub fn compare(
    runtime: &FeedRuntime,
    data: &Path,
    options: &BenchOptions,
) -> Result<CompareReport> {
    let mut dataset = load(runtime, data, options)?;
    let encoder = runtime.encoder();
    let mut copying = build_engine(&dataset, &encoder)?;
    let mut zero_copy = copying.try_clone()?;

    let batches = options.batches_per_repeat(&dataset);
    let mut input_sets: Vec<Vec<OwnedTensor>> = Vec::with_capacity(batches);

    for _ in 0..batches {
        let batch = dataset.next_batch()?;

        let mut sink = CopySink::new();
        feed_batch(&encoder, batch, &mut sink)?;
        let expected = copying.run(sink.inputs())?;

        run_zero_copy_path(zero_copy.as_mut(), &encoder, batch)?;
        let actual = zero_copy
            .output_names()
            .iter()
            .map(|name| zero_copy.output(name))
            .collect::<Result<Vec<_>>>()?;

        compare_tensors(&expected, &actual, COMPARE_TOLERANCE)?;
        tracing::debug!(batch = batch.index(), "outputs agree");

        input_sets.push(sink.into_inputs());
    }

    check_deterministic(&mut copying, &input_sets, options.repeat.max(2), COMPARE_TOLERANCE)?;

    for (pass, count) in copying.fusion_stats() {
        tracing::info!(pass = %pass, count, "fusion statistics");
    }

    tracing::info!(batches, "copying and zero-copy outputs agree");
    Ok(CompareReport {
        batches_compared: batches,
    })
}
