//! Fixed-size worker pool that runs one batch of jobs.

use std::time::{Duration, Instant};

use augbench_pipeline::StagePipeline;
use rayon::prelude::*;
use tracing::{error, info};

use crate::error::BenchError;
use crate::job::{JobDescriptor, JobOutcome, run_job};

/// Result of one timed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub pool_size: usize,
    /// Wall-clock time from pool construction until every job finished.
    pub elapsed: Duration,
    /// Jobs that wrote all their variants.
    pub written: usize,
    /// Jobs whose source could not be decoded.
    pub skipped: usize,
    /// Jobs that failed while writing output.
    pub failed: usize,
}

impl BatchReport {
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Run every job on a dedicated pool of `pool_size` worker threads and
/// block until all of them have finished.
///
/// Job failures are logged and counted; they never abort the batch. The
/// measured time includes building and tearing down the pool.
///
/// # Errors
///
/// Returns [`BenchError::InvalidConfig`] if `pool_size` is zero, or
/// [`BenchError::ThreadPool`] if the pool cannot be built.
pub fn run_batch(
    jobs: &[JobDescriptor],
    pool_size: usize,
    pipeline: &StagePipeline,
    base_seed: u64,
) -> Result<BatchReport, BenchError> {
    if pool_size == 0 {
        return Err(BenchError::InvalidConfig(
            "pool size must be at least 1".to_owned(),
        ));
    }

    let start = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(pool_size)
        .thread_name(|i| format!("augbench-worker-{i}"))
        .build()?;

    let outcomes: Vec<_> = pool.install(|| {
        jobs.par_iter()
            .map(|job| (job, run_job(job, pipeline, base_seed)))
            .collect()
    });
    drop(pool);

    let elapsed = start.elapsed();

    let mut report = BatchReport {
        pool_size,
        elapsed,
        written: 0,
        skipped: 0,
        failed: 0,
    };
    for (job, outcome) in outcomes {
        match outcome {
            Ok(JobOutcome::Written(_)) => report.written += 1,
            Ok(JobOutcome::Skipped) => report.skipped += 1,
            Err(e) => {
                error!(image = %job.image_name, error = %e, "job failed");
                report.failed += 1;
            }
        }
    }

    info!(
        pool_size,
        elapsed_ms = elapsed.as_millis(),
        written = report.written,
        skipped = report.skipped,
        failed = report.failed,
        "batch finished",
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    use std::path::Path;

    use image::{Rgb, RgbImage};

    fn fixture(names: &[&str]) -> (tempfile::TempDir, tempfile::TempDir, Vec<JobDescriptor>) {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let jobs = names
            .iter()
            .map(|name| {
                RgbImage::from_pixel(6, 5, Rgb([30, 140, 220]))
                    .save(input.path().join(name))
                    .unwrap();
                JobDescriptor::new(input.path(), output.path(), *name)
            })
            .collect();
        (input, output, jobs)
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map_or(0, Iterator::count)
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let pipeline = StagePipeline::default();
        let err = run_batch(&[], 0, &pipeline, 0).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }

    #[test]
    fn empty_job_list_finishes() {
        let report = run_batch(&[], 2, &StagePipeline::default(), 0).unwrap();
        assert_eq!(report.written + report.skipped + report.failed, 0);
        assert!(report.elapsed_secs() >= 0.0);
    }

    #[test]
    fn sequential_pool_processes_every_job() {
        let (_input, _output, jobs) = fixture(&["a.png", "b.png", "c.png"]);
        let pipeline = StagePipeline::default().truncated(2);
        let report = run_batch(&jobs, 1, &pipeline, 0).unwrap();
        assert_eq!(report.pool_size, 1);
        assert_eq!(report.written, 3);
        for job in &jobs {
            assert_eq!(file_count(&job.dest_dir), 4);
        }
    }

    #[test]
    fn pool_size_does_not_change_output_count() {
        let (_input, _output, jobs) = fixture(&["a.png", "b.png", "c.png", "d.png"]);
        let pipeline = StagePipeline::default().truncated(3);
        for pool_size in [1, 2, 4] {
            let report = run_batch(&jobs, pool_size, &pipeline, 0).unwrap();
            assert_eq!(report.written, 4);
            for job in &jobs {
                assert_eq!(file_count(&job.dest_dir), 8, "pool size {pool_size}");
            }
        }
    }

    #[test]
    fn corrupt_image_does_not_block_others() {
        let (input, _output, mut jobs) = fixture(&["good.png"]);
        std::fs::write(input.path().join("bad.png"), b"\x89PNG garbage").unwrap();
        let out_root = jobs[0].dest_dir.parent().unwrap().to_path_buf();
        jobs.push(JobDescriptor::new(input.path(), &out_root, "bad.png"));

        let report = run_batch(&jobs, 2, &StagePipeline::default().truncated(2), 0).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(file_count(&jobs[0].dest_dir), 4);
        assert!(!jobs[1].dest_dir.exists());
    }

    #[test]
    fn write_failures_are_counted_without_aborting() {
        let (input, _output, mut jobs) = fixture(&["good.png", "blocked.png"]);
        let out_root = jobs[0].dest_dir.parent().unwrap().to_path_buf();

        // A regular file where the destination directory should go.
        std::fs::write(&jobs[1].dest_dir, b"in the way").unwrap();

        // Decodes as PNG, but the extension has no encoder.
        RgbImage::from_pixel(6, 5, Rgb([1, 2, 3]))
            .save_with_format(input.path().join("odd.xyz"), image::ImageFormat::Png)
            .unwrap();
        jobs.push(JobDescriptor::new(input.path(), &out_root, "odd.xyz"));

        let pipeline = StagePipeline::default().truncated(2);
        assert!(matches!(
            run_job(&jobs[1], &pipeline, 0),
            Err(crate::error::JobError::CreateDir { .. })
        ));
        assert!(matches!(
            run_job(&jobs[2], &pipeline, 0),
            Err(crate::error::JobError::Encode { .. })
        ));

        let report = run_batch(&jobs, 2, &pipeline, 0).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(file_count(&jobs[0].dest_dir), 4);
    }
}
