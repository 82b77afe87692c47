//! Experiment driver: one ordering timed across every pool size.

use std::path::Path;

use augbench_pipeline::StagePipeline;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{BenchConfig, OutputPolicy};
use crate::enumerate::{SortOrder, list_images};
use crate::error::BenchError;
use crate::job::JobDescriptor;
use crate::runner::{BatchReport, run_batch};

/// One `(pool size, elapsed seconds)` measurement. Seconds are rounded
/// to hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    pub pool_size: usize,
    pub elapsed_secs: f64,
}

/// The labelled samples of one experiment, in pool-size run order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub label: String,
    pub samples: Vec<TimingSample>,
}

impl ExperimentResult {
    /// Samples as `(x, y)` chart points.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.pool_size as f64, s.elapsed_secs))
            .collect()
    }
}

/// A named processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    pub name: String,
    pub order: SortOrder,
}

impl Experiment {
    #[must_use]
    pub fn new(name: impl Into<String>, order: SortOrder) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }

    /// Largest files dispatched first.
    #[must_use]
    pub fn largest_first() -> Self {
        Self::new("Largest to Smallest", SortOrder::Descending)
    }

    /// Smallest files dispatched first.
    #[must_use]
    pub fn smallest_first() -> Self {
        Self::new("Smallest to Largest", SortOrder::Ascending)
    }

    /// Human-readable label including the image count.
    #[must_use]
    pub fn label(&self, image_count: usize) -> String {
        format!("{} - {image_count} Images", self.name)
    }
}

/// Progress hooks around each timed run.
///
/// Both methods default to doing nothing; `()` is the silent observer.
pub trait RunObserver {
    fn run_started(&mut self, _pool_size: usize) {}
    fn run_finished(&mut self, _report: &BatchReport) {}
}

impl RunObserver for () {}

fn round_hundredths(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// One job per image name, all sharing the same input and output roots.
#[must_use]
pub fn build_jobs(input_dir: &Path, output_dir: &Path, names: &[String]) -> Vec<JobDescriptor> {
    names
        .iter()
        .map(|name| JobDescriptor::new(input_dir, output_dir, name.as_str()))
        .collect()
}

/// Remove each job's destination directory if it exists.
fn purge(jobs: &[JobDescriptor]) -> Result<(), BenchError> {
    for job in jobs {
        match std::fs::remove_dir_all(&job.dest_dir) {
            Ok(()) => debug!(path = %job.dest_dir.display(), "purged"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BenchError::Purge {
                    path: job.dest_dir.clone(),
                    source,
                });
            }
        }
    }
    Ok(())
}

/// Enumerate the input once, then time one batch per configured pool
/// size.
///
/// The same job list is reused for every run. With
/// [`OutputPolicy::Overwrite`] later runs overwrite earlier output; with
/// [`OutputPolicy::Purge`] destination directories are removed before
/// each run, outside the timed section.
///
/// # Errors
///
/// Returns [`BenchError::Enumerate`] if the input directory cannot be
/// listed, [`BenchError::Purge`] if stale output cannot be removed, or
/// any error from [`run_batch`].
pub fn run_experiment<O: RunObserver + ?Sized>(
    config: &BenchConfig,
    pipeline: &StagePipeline,
    experiment: &Experiment,
    observer: &mut O,
) -> Result<ExperimentResult, BenchError> {
    let names = list_images(&config.input_dir, experiment.order)?;
    let jobs = build_jobs(&config.input_dir, &config.output_dir, &names);
    let label = experiment.label(jobs.len());
    info!(%label, stages = pipeline.len(), "starting experiment");

    let mut samples = Vec::with_capacity(config.pool_sizes.len());
    for &pool_size in &config.pool_sizes {
        if config.output_policy == OutputPolicy::Purge {
            purge(&jobs)?;
        }

        observer.run_started(pool_size);
        let report = run_batch(&jobs, pool_size, pipeline, config.seed)?;
        observer.run_finished(&report);

        samples.push(TimingSample {
            pool_size,
            elapsed_secs: round_hundredths(report.elapsed_secs()),
        });
    }

    Ok(ExperimentResult { label, samples })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    use image::{Rgb, RgbImage};

    #[derive(Default)]
    struct Recorder {
        started: Vec<usize>,
        finished: Vec<BatchReport>,
    }

    impl RunObserver for Recorder {
        fn run_started(&mut self, pool_size: usize) {
            self.started.push(pool_size);
        }

        fn run_finished(&mut self, report: &BatchReport) {
            self.finished.push(*report);
        }
    }

    fn setup(names: &[&str]) -> (tempfile::TempDir, BenchConfig) {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("in");
        std::fs::create_dir(&input).unwrap();
        for (i, name) in names.iter().enumerate() {
            let side = 4 + u32::try_from(i).unwrap() * 3;
            RgbImage::from_pixel(side, side, Rgb([10, 200, 90]))
                .save(input.join(name))
                .unwrap();
        }
        let config = BenchConfig {
            input_dir: input,
            output_dir: root.path().join("out"),
            pool_sizes: vec![1, 2],
            stages: Some(2),
            ..BenchConfig::default()
        };
        (root, config)
    }

    #[test]
    fn labels() {
        assert_eq!(
            Experiment::largest_first().label(2),
            "Largest to Smallest - 2 Images"
        );
        assert_eq!(Experiment::smallest_first().order, SortOrder::Ascending);
    }

    #[test]
    fn build_jobs_preserves_order() {
        let names = vec!["b.png".to_owned(), "a.png".to_owned()];
        let jobs = build_jobs(Path::new("in"), Path::new("out"), &names);
        assert_eq!(jobs[0].image_name, "b.png");
        assert_eq!(jobs[1].dest_dir, Path::new("out").join("a"));
    }

    #[test]
    fn samples_follow_pool_sizes() {
        let (_root, mut config) = setup(&["a.png", "b.png"]);
        config.pool_sizes = vec![4, 1, 2];
        let mut recorder = Recorder::default();
        let result = run_experiment(
            &config,
            &config.pipeline(),
            &Experiment::largest_first(),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(result.label, "Largest to Smallest - 2 Images");
        let sizes: Vec<usize> = result.samples.iter().map(|s| s.pool_size).collect();
        assert_eq!(sizes, [4, 1, 2]);
        assert!(result.samples.iter().all(|s| s.elapsed_secs >= 0.0));
        assert_eq!(recorder.started, [4, 1, 2]);
        assert!(recorder.finished.iter().all(|r| r.written == 2));
    }

    #[test]
    fn missing_input_is_fatal() {
        let (_root, mut config) = setup(&[]);
        config.input_dir = config.input_dir.join("nope");
        let err = run_experiment(
            &config,
            &config.pipeline(),
            &Experiment::smallest_first(),
            &mut (),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::Enumerate(_)));
    }

    #[test]
    fn purge_removes_stale_files() {
        let (_root, mut config) = setup(&["a.png"]);
        let stale = config.output_dir.join("a").join("stale.png");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        config.output_policy = OutputPolicy::Purge;
        run_experiment(
            &config,
            &config.pipeline(),
            &Experiment::largest_first(),
            &mut (),
        )
        .unwrap();

        assert!(!stale.exists());
        assert_eq!(
            std::fs::read_dir(config.output_dir.join("a")).unwrap().count(),
            4
        );
    }

    #[test]
    fn overwrite_keeps_unrelated_files() {
        let (_root, config) = setup(&["a.png"]);
        let extra = config.output_dir.join("a").join("keep.txt");
        std::fs::create_dir_all(extra.parent().unwrap()).unwrap();
        std::fs::write(&extra, b"keep").unwrap();

        run_experiment(
            &config,
            &config.pipeline(),
            &Experiment::largest_first(),
            &mut (),
        )
        .unwrap();

        assert!(extra.exists());
    }

    #[test]
    fn samples_are_rounded_to_hundredths() {
        assert!((round_hundredths(1.23456) - 1.23).abs() < 1e-12);
        assert!((round_hundredths(0.005_1) - 0.01).abs() < 1e-12);
        assert!(round_hundredths(0.001).abs() < f64::EPSILON);

        let (_root, config) = setup(&["a.png"]);
        let result = run_experiment(
            &config,
            &config.pipeline(),
            &Experiment::largest_first(),
            &mut (),
        )
        .unwrap();
        for sample in &result.samples {
            let scaled = sample.elapsed_secs * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn points_map_samples() {
        let result = ExperimentResult {
            label: "x".to_owned(),
            samples: vec![
                TimingSample {
                    pool_size: 1,
                    elapsed_secs: 2.5,
                },
                TimingSample {
                    pool_size: 2,
                    elapsed_secs: 1.5,
                },
            ],
        };
        assert_eq!(result.points(), [(1.0, 2.5), (2.0, 1.5)]);
    }
}
