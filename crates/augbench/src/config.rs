//! Benchmark run configuration.

use std::path::PathBuf;

use augbench_pipeline::StagePipeline;
use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// What happens to existing output before each timed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputPolicy {
    /// Leave earlier output in place; later runs overwrite it file by
    /// file.
    #[default]
    Overwrite,
    /// Remove every job's destination directory before each run. The
    /// removal is not timed.
    Purge,
}

/// Everything one benchmark invocation needs.
///
/// Missing fields take their [`Default`] values when deserialized, so a
/// partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Directory of source images.
    pub input_dir: PathBuf,

    /// Root under which one subdirectory per source image is written.
    pub output_dir: PathBuf,

    /// Worker-pool sizes to time, in run order.
    pub pool_sizes: Vec<usize>,

    /// Base seed mixed into every job's RNG.
    pub seed: u64,

    pub output_policy: OutputPolicy,

    /// Run only the first `n` stages of the default schedule.
    /// `None` runs all of them.
    pub stages: Option<usize>,

    /// Where to write one SVG chart per experiment. `None` skips charts.
    pub chart_dir: Option<PathBuf>,
}

impl BenchConfig {
    pub const DEFAULT_INPUT_DIR: &'static str = "Input_Images";
    pub const DEFAULT_OUTPUT_DIR: &'static str = "Augmented_Images";
    pub const DEFAULT_MIN_WORKERS: usize = 1;
    pub const DEFAULT_MAX_WORKERS: usize = 16;
    pub const DEFAULT_SEED: u64 = 0;

    /// Check the configuration against a schedule of `schedule_len`
    /// stages.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidConfig`] if there are no pool sizes,
    /// any pool size is zero, or `stages` exceeds `schedule_len`.
    pub fn validate(&self, schedule_len: usize) -> Result<(), BenchError> {
        if self.pool_sizes.is_empty() {
            return Err(BenchError::InvalidConfig(
                "at least one pool size is required".to_owned(),
            ));
        }
        if self.pool_sizes.contains(&0) {
            return Err(BenchError::InvalidConfig(
                "pool sizes must be at least 1".to_owned(),
            ));
        }
        if let Some(stages) = self.stages
            && stages > schedule_len
        {
            return Err(BenchError::InvalidConfig(format!(
                "stages must be at most {schedule_len}, got {stages}"
            )));
        }
        Ok(())
    }

    /// The default schedule, cut to [`stages`](Self::stages) if set.
    #[must_use]
    pub fn pipeline(&self) -> StagePipeline {
        let pipeline = StagePipeline::default();
        match self.stages {
            Some(stages) => pipeline.truncated(stages),
            None => pipeline,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(Self::DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(Self::DEFAULT_OUTPUT_DIR),
            pool_sizes: (Self::DEFAULT_MIN_WORKERS..=Self::DEFAULT_MAX_WORKERS).collect(),
            seed: Self::DEFAULT_SEED,
            output_policy: OutputPolicy::default(),
            stages: None,
            chart_dir: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("Input_Images"));
        assert_eq!(config.output_dir, PathBuf::from("Augmented_Images"));
        assert_eq!(config.pool_sizes, (1..=16).collect::<Vec<_>>());
        assert_eq!(config.seed, 0);
        assert_eq!(config.output_policy, OutputPolicy::Overwrite);
        assert_eq!(config.stages, None);
        assert_eq!(config.chart_dir, None);
    }

    #[test]
    fn default_config_is_valid() {
        BenchConfig::default().validate(8).unwrap();
    }

    #[test]
    fn rejects_empty_pool_sizes() {
        let config = BenchConfig {
            pool_sizes: vec![],
            ..BenchConfig::default()
        };
        assert!(matches!(
            config.validate(8),
            Err(BenchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_pool_size() {
        let config = BenchConfig {
            pool_sizes: vec![1, 0, 2],
            ..BenchConfig::default()
        };
        assert!(matches!(
            config.validate(8),
            Err(BenchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_too_many_stages() {
        let config = BenchConfig {
            stages: Some(9),
            ..BenchConfig::default()
        };
        assert!(config.validate(8).is_err());
        let config = BenchConfig {
            stages: Some(8),
            ..BenchConfig::default()
        };
        assert!(config.validate(8).is_ok());
    }

    #[test]
    fn pipeline_honours_stage_limit() {
        assert_eq!(BenchConfig::default().pipeline().len(), 8);
        let config = BenchConfig {
            stages: Some(5),
            ..BenchConfig::default()
        };
        assert_eq!(config.pipeline().variant_count(), Some(32));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: BenchConfig =
            serde_json::from_str(r#"{"pool_sizes":[1,2,4],"output_policy":"Purge"}"#).unwrap();
        assert_eq!(config.pool_sizes, [1, 2, 4]);
        assert_eq!(config.output_policy, OutputPolicy::Purge);
        assert_eq!(config.input_dir, PathBuf::from("Input_Images"));
    }
}
