//! Chart output for experiment results.

use std::path::{Path, PathBuf};

use augbench_export::{ChartMetadata, Series, to_chart_svg};
use tracing::info;

use crate::error::BenchError;
use crate::experiment::ExperimentResult;

/// Render one experiment as an SVG line chart.
#[must_use]
pub fn render(result: &ExperimentResult) -> String {
    let title = format!("Image Augmentation: {}", result.label);
    let description = describe(result);
    let points = result.points();
    let series = [Series {
        label: &result.label,
        points: &points,
    }];
    let metadata = ChartMetadata {
        title: Some(&title),
        description: Some(&description),
        x_label: "Process Count",
        y_label: "Process Time (seconds)",
    };
    to_chart_svg(&series, &metadata)
}

/// One-line summary of the runs behind a chart.
fn describe(result: &ExperimentResult) -> String {
    let sizes = result.samples.iter().map(|s| s.pool_size);
    match (sizes.clone().min(), sizes.max()) {
        (Some(lo), Some(hi)) => format!(
            "{}: {} runs, pool sizes {lo} to {hi}",
            result.label,
            result.samples.len()
        ),
        _ => format!("{}: no runs", result.label),
    }
}

/// File name for a label: lowercase ASCII alphanumerics, with every
/// other run of characters collapsed to one `-`.
#[must_use]
pub fn file_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("chart");
    }
    slug
}

/// Write the chart for `result` to `<dir>/<slug>.svg`, creating `dir`
/// if needed. Returns the written path.
///
/// # Errors
///
/// Returns [`BenchError::WriteChart`] if the directory cannot be created
/// or the file cannot be written.
pub fn write_chart(dir: &Path, result: &ExperimentResult) -> Result<PathBuf, BenchError> {
    let path = dir.join(format!("{}.svg", file_slug(&result.label)));
    let to_err = |source| BenchError::WriteChart {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(to_err)?;
    let svg = render(result);
    std::fs::write(&path, &svg).map_err(to_err)?;
    info!(path = %path.display(), bytes = svg.len(), "chart written");
    Ok(path)
}
