//! Sequence Feed Bench
//!
//! Feeds batches from a sequence dataset into the reference predictor and
//! times or cross-checks the copying and zero-copy paths.
//!
//! # Usage
//!
//! ```bash
//! # Time the copying path on one batch of 32 samples
//! seqfeed-bench --data data.txt --batch-size 32 profile
//!
//! # Time the zero-copy path on 4 threads over the whole dataset
//! seqfeed-bench --data data.txt --num-threads 4 --repeat 10 --test-all-data zero-copy
//!
//! # Check both paths agree, with a configuration file
//! seqfeed-bench --config seqfeed.toml --data data.txt compare
//! ```

mod profile;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use profile::BenchOptions;
use seqfeed_core::{FeedConfig, FeedRuntime};

/// Sequence feed bench
#[derive(Parser, Debug)]
#[command(name = "seqfeed-bench")]
#[command(about = "Drives a predictor with batches from a sequence dataset")]
struct Args {
    /// Dataset file, relative to the configured base path
    #[arg(short, long)]
    data: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Samples per batch; overrides the configured value
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Worker threads for the zero-copy run
    #[arg(long, default_value = "1")]
    num_threads: usize,

    /// Timed passes per run
    #[arg(long, default_value = "1")]
    repeat: usize,

    /// Feed every batch in the dataset instead of only the first
    #[arg(long)]
    test_all_data: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Time the copying path
    Profile,
    /// Time the zero-copy path on one or more threads
    ZeroCopy,
    /// Check the copying and zero-copy paths produce the same outputs
    Compare,
}

fn build_runtime(args: &Args) -> seqfeed_core::Result<FeedRuntime> {
    match &args.config {
        Some(path) => FeedRuntime::from_config_file(path),
        None => FeedRuntime::from_config(FeedConfig::default().with_env_overrides()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = build_runtime(&args)?;
    let options = BenchOptions {
        batch_size: args
            .batch_size
            .unwrap_or(runtime.config().batching.batch_size),
        num_threads: args.num_threads,
        repeat: args.repeat,
        test_all_data: args.test_all_data,
    };

    tracing::info!("Starting seqfeed bench");
    tracing::info!("  Dataset: {}", args.data.display());
    tracing::info!("  Mode: {:?}", args.mode);
    tracing::info!("  Batch size: {}", options.batch_size);
    tracing::info!("  Threads: {}", options.num_threads);
    tracing::info!("  Repeat: {}", options.repeat);

    let result = match args.mode {
        Mode::Profile => profile::profile(&runtime, &args.data, &options).map(|_| ()),
        Mode::ZeroCopy => profile::zero_copy(&runtime, &args.data, &options).map(|_| ()),
        Mode::Compare => profile::compare(&runtime, &args.data, &options).map(|_| ()),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "bench failed");
    }
    result?;

    Ok(())
}
