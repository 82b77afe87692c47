//! augbench: Image augmentation throughput benchmark.
//!
//! Lists the images in an input directory, expands each into `2^k`
//! variants with the stage pipeline from [`augbench_pipeline`], and times
//! the whole batch on worker pools of increasing size. Each ordering of
//! the input (largest first, smallest first) is one experiment producing
//! a series of timing samples that can be charted with
//! [`augbench_export`].
//!
//! The pieces, bottom up:
//!
//! - [`enumerate`]: size-ordered directory listing
//! - [`job`]: one image's decode, augment, and write
//! - [`runner`]: one timed batch on a dedicated thread pool
//! - [`experiment`]: one ordering across all pool sizes
//! - [`chart`]: SVG output for experiment results

pub mod chart;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod experiment;
pub mod job;
pub mod runner;

pub use config::{BenchConfig, OutputPolicy};
pub use enumerate::{SortOrder, list_images};
pub use error::{BenchError, EnumerateError, JobError};
pub use experiment::{
    Experiment, ExperimentResult, RunObserver, TimingSample, build_jobs, run_experiment,
};
pub use job::{JobDescriptor, JobOutcome, output_name, run_job};
pub use runner::{BatchReport, run_batch};
