//! Input directory listing ordered by file size.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EnumerateError;

/// Direction for ordering images by byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest file first.
    Ascending,
    /// Largest file first.
    Descending,
}

/// List the regular files in `dir`, ordered by byte size.
///
/// Subdirectories are excluded; symlinks are followed. Files of equal
/// size are ordered by name, so [`SortOrder::Descending`] is exactly the
/// reverse of [`SortOrder::Ascending`]. Entries whose name is not valid
/// UTF-8 or whose metadata cannot be read are skipped with a warning.
///
/// # Errors
///
/// Returns [`EnumerateError::ReadDir`] if `dir` does not exist or cannot
/// be read.
pub fn list_images(dir: &Path, order: SortOrder) -> Result<Vec<String>, EnumerateError> {
    let read_dir_err = |source| EnumerateError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files: Vec<(u64, String)> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let path = entry.path();

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!(name = ?raw, "skipping entry with non-UTF-8 name");
                continue;
            }
        };

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !metadata.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        files.push((metadata.len(), name));
    }

    files.sort_unstable();
    if order == SortOrder::Descending {
        files.reverse();
    }

    debug!(dir = %dir.display(), count = files.len(), ?order, "listed images");
    Ok(files.into_iter().map(|(_, name)| name).collect())
}
