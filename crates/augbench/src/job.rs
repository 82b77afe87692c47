//! One image's unit of work: decode, augment, write every variant.

use std::ffi::OsStr;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use augbench_pipeline::StagePipeline;
use rand::SeedableRng;
use rand::rngs::StdRng;
use siphasher::sip::SipHasher13;
use tracing::{debug, warn};

use crate::error::JobError;

/// Where one image comes from and where its variants go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub source_dir: PathBuf,
    pub image_name: String,
    pub dest_dir: PathBuf,
}

impl JobDescriptor {
    /// Describe the job for `image_name` in `input_dir`. Variants go to a
    /// subdirectory of `output_root` named after the file stem.
    #[must_use]
    pub fn new(input_dir: &Path, output_root: &Path, image_name: impl Into<String>) -> Self {
        let image_name = image_name.into();
        let stem = Path::new(&image_name)
            .file_stem()
            .unwrap_or_else(|| OsStr::new(&image_name));
        let dest_dir = output_root.join(stem);
        Self {
            source_dir: input_dir.to_path_buf(),
            image_name,
            dest_dir,
        }
    }

    /// Full path of the source image.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.image_name)
    }
}

/// How a job ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// This many variants were written.
    Written(usize),
    /// The source could not be read or decoded; nothing was written.
    Skipped,
}

/// File name of variant `index` of `image_name`.
#[must_use]
pub fn output_name(index: usize, image_name: &str) -> String {
    format!("aug_{index}_{image_name}")
}

/// RNG seed for one image, derived from the run's base seed and the
/// file name. Independent of job order and pool size.
#[must_use]
pub fn job_seed(base_seed: u64, image_name: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(base_seed, 0);
    hasher.write(image_name.as_bytes());
    hasher.finish()
}

/// Run the pipeline on one image and write all variants.
///
/// An unreadable or undecodable source is logged and reported as
/// [`JobOutcome::Skipped`] without creating the destination directory.
///
/// # Errors
///
/// Returns [`JobError::CreateDir`] if the destination directory cannot
/// be created, or [`JobError::Encode`] if a variant cannot be encoded or
/// written. The encoding format follows the file extension.
pub fn run_job(
    job: &JobDescriptor,
    pipeline: &StagePipeline,
    base_seed: u64,
) -> Result<JobOutcome, JobError> {
    let source = job.source_path();
    let bytes = match std::fs::read(&source) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %source.display(), error = %e, "failed to read image, skipping");
            return Ok(JobOutcome::Skipped);
        }
    };

    let mut rng = StdRng::seed_from_u64(job_seed(base_seed, &job.image_name));
    let family = match augbench_pipeline::augment(&bytes, pipeline, &mut rng) {
        Ok(family) => family,
        Err(e) => {
            warn!(path = %source.display(), error = %e, "failed to load image, skipping");
            return Ok(JobOutcome::Skipped);
        }
    };

    std::fs::create_dir_all(&job.dest_dir).map_err(|source| JobError::CreateDir {
        path: job.dest_dir.clone(),
        source,
    })?;

    for (index, variant) in family.iter().enumerate() {
        let path = job.dest_dir.join(output_name(index, &job.image_name));
        variant
            .save(&path)
            .map_err(|source| JobError::Encode { path, source })?;
    }

    debug!(image = %job.image_name, written = family.len(), "job finished");
    Ok(JobOutcome::Written(family.len()))
}
