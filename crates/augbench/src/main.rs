//! augbench: time image augmentation across worker-pool sizes.
//!
//! Runs two experiments over the input directory, largest images first
//! and smallest images first. Each experiment times the full augmentation
//! batch once per pool size and either writes an SVG chart per
//! experiment or prints a summary table.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin augbench -- [OPTIONS]
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use augbench::{
    BatchReport, BenchConfig, BenchError, Experiment, ExperimentResult, OutputPolicy,
    RunObserver, run_experiment,
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Image augmentation throughput benchmark.
///
/// Expands every image in the input directory into 2^k augmented
/// variants and measures the wall-clock time for the whole batch at each
/// worker-pool size.
#[derive(Parser)]
#[command(name = "augbench", version)]
struct Cli {
    /// Directory of source images.
    #[arg(long, default_value = BenchConfig::DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Root directory for augmented output.
    #[arg(long, default_value = BenchConfig::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Smallest worker-pool size to time.
    #[arg(long, default_value_t = BenchConfig::DEFAULT_MIN_WORKERS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    min_workers: usize,

    /// Largest worker-pool size to time.
    #[arg(long, default_value_t = BenchConfig::DEFAULT_MAX_WORKERS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_workers: usize,

    /// Base seed for every job's random number generator.
    #[arg(long, default_value_t = BenchConfig::DEFAULT_SEED)]
    seed: u64,

    /// Remove existing output directories before each timed run.
    #[arg(long)]
    purge: bool,

    /// Run only the first N stages of the schedule (0-8).
    #[arg(long)]
    stages: Option<usize>,

    /// Write one SVG chart per experiment into this directory.
    #[arg(long)]
    chart_dir: Option<PathBuf>,

    /// Print experiment results as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Full benchmark config as a JSON string.
    ///
    /// When provided, all other configuration flags are ignored.
    /// The JSON must be a valid `BenchConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`BenchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual configuration flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<BenchConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(BenchConfig {
        input_dir: cli.input.clone(),
        output_dir: cli.output.clone(),
        pool_sizes: (cli.min_workers..=cli.max_workers).collect(),
        seed: cli.seed,
        output_policy: if cli.purge {
            OutputPolicy::Purge
        } else {
            OutputPolicy::Overwrite
        },
        stages: cli.stages,
        chart_dir: cli.chart_dir.clone(),
    })
}

/// Prints the per-run progress lines.
///
/// Goes to stderr when stdout carries JSON.
struct ConsoleObserver {
    to_stderr: bool,
}

impl ConsoleObserver {
    fn line(&self, text: &str) {
        if self.to_stderr {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn run_started(&mut self, pool_size: usize) {
        self.line(&format!("\nRunning with {pool_size} processes..."));
    }

    fn run_finished(&mut self, report: &BatchReport) {
        self.line(&format!("Finished in {:.2} seconds.", report.elapsed_secs()));
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<Vec<ExperimentResult>, BenchError> {
    let config = config_from_cli(cli).map_err(BenchError::InvalidConfig)?;
    config.validate(augbench_pipeline::StagePipeline::default().len())?;
    let pipeline = config.pipeline();

    let mut observer = ConsoleObserver {
        to_stderr: cli.json,
    };
    let mut results = Vec::new();
    for experiment in [Experiment::largest_first(), Experiment::smallest_first()] {
        let result = run_experiment(&config, &pipeline, &experiment, &mut observer)?;
        if let Some(ref dir) = config.chart_dir {
            let path = augbench::chart::write_chart(dir, &result)?;
            eprintln!("Chart written to {}", path.display());
        }
        results.push(result);
    }

    if config.chart_dir.is_none() && !cli.json {
        print_summary(&results);
    }
    Ok(results)
}

/// Print one table per experiment.
fn print_summary(results: &[ExperimentResult]) {
    for result in results {
        println!();
        println!("{}\n{}", result.label, "=".repeat(result.label.len()));
        println!("{:>10}  {:>10}", "Processes", "Seconds");
        for sample in &result.samples {
            println!("{:>10}  {:>10.2}", sample.pool_size, sample.elapsed_secs);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let results = match run(&cli) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing results: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
