//! Error types for the benchmark driver.

use std::path::PathBuf;

/// Listing the input directory failed.
#[derive(Debug, thiserror::Error)]
pub enum EnumerateError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One job could not write its output.
///
/// Decode failures are not errors; they make the job
/// [`Skipped`](crate::job::JobOutcome::Skipped).
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Fatal errors that abort an experiment.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error(transparent)]
    Enumerate(#[from] EnumerateError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to purge {path}: {source}")]
    Purge {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write chart {path}: {source}")]
    WriteChart {
        path: PathBuf,
        source: std::io::Error,
    },
}
