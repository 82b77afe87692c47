//! SVG line chart serializer.
//!
//! Renders one or more `(x, y)` series as a line chart with point
//! markers, grid lines, tick labels, axis labels, and a legend. Built
//! with the [`svg`] crate for document construction, XML escaping, and
//! path data formatting.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Line, Path, Rectangle, Title};
use svg::node::{Node, Text};

/// Chart width in SVG user units.
pub const CHART_WIDTH: u32 = 800;
/// Chart height in SVG user units.
pub const CHART_HEIGHT: u32 = 500;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 55.0;

/// Stroke colors cycled across series.
const SERIES_COLORS: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

/// One labelled line on the chart.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    /// Legend text.
    pub label: &'a str,
    /// Points in data coordinates, drawn in the given order.
    pub points: &'a [(f64, f64)],
}

/// Text decorations for the chart.
#[derive(Debug, Clone, Default)]
pub struct ChartMetadata<'a> {
    /// Heading drawn above the plot and emitted as `<title>`.
    pub title: Option<&'a str>,
    /// Emitted as `<desc>`.
    pub description: Option<&'a str>,
    /// Label under the x-axis.
    pub x_label: &'a str,
    /// Label beside the y-axis.
    pub y_label: &'a str,
}

/// Linear mapping from a data range onto a pixel range.
#[derive(Debug, Clone, Copy)]
struct Axis {
    lo: f64,
    hi: f64,
    px_lo: f64,
    px_hi: f64,
}

impl Axis {
    fn map(&self, v: f64) -> f64 {
        (v - self.lo) / (self.hi - self.lo) * (self.px_hi - self.px_lo) + self.px_lo
    }
}

/// Pick "nice" tick positions (1, 2, or 5 times a power of ten) covering
/// `lo..=hi` with roughly `target` intervals.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn nice_ticks(lo: f64, hi: f64, target: u32) -> Vec<f64> {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 || target == 0 {
        return vec![lo];
    }
    let raw = span / f64::from(target);
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let step = magnitude
        * if residual < 1.5 {
            1.0
        } else if residual < 3.0 {
            2.0
        } else if residual < 7.0 {
            5.0
        } else {
            10.0
        };

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Format a tick value without trailing zeros.
fn format_tick(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Build a `<text>` element.
fn text(content: &str, x: f64, y: f64, anchor: &str, size: u32) -> Element {
    let mut el = Element::new("text");
    el.assign("x", x);
    el.assign("y", y);
    el.assign("text-anchor", anchor);
    el.assign("font-family", "sans-serif");
    el.assign("font-size", size);
    el.append(Text::new(content));
    el
}

/// Data range of all series, padded so single points and flat lines
/// still get a visible extent. The y range always starts at zero.
fn data_bounds(series: &[Series<'_>]) -> ((f64, f64), (f64, f64)) {
    let all = || series.iter().flat_map(|s| s.points.iter().copied());
    let x_min = all().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = all().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_max = all().map(|p| p.1).fold(0.0, f64::max);

    let (x_lo, x_hi) = if x_min.is_finite() && x_max.is_finite() {
        if x_max > x_min {
            (x_min, x_max)
        } else {
            (x_min - 1.0, x_max + 1.0)
        }
    } else {
        (0.0, 1.0)
    };
    let y_hi = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };
    ((x_lo, x_hi), (0.0, y_hi))
}

/// Serialize series into an SVG line chart.
///
/// The x range spans the smallest to largest x across all series; the
/// y range runs from zero to 10% above the largest y. Points are joined
/// in input order and marked with circles. Each series gets a legend
/// entry in the top-right corner of the plot.
///
/// # Examples
///
/// ```
/// use augbench_export::{ChartMetadata, Series, to_chart_svg};
///
/// let points = [(1.0, 4.2), (2.0, 2.3), (4.0, 1.4)];
/// let series = [Series { label: "Largest to Smallest", points: &points }];
/// let metadata = ChartMetadata {
///     title: Some("Image Augmentation"),
///     x_label: "Process Count",
///     y_label: "Process Time (seconds)",
///     ..ChartMetadata::default()
/// };
/// let svg = to_chart_svg(&series, &metadata);
/// assert!(svg.contains("<title>Image Augmentation</title>"));
/// assert!(svg.contains("Largest to Smallest"));
/// ```
#[must_use]
pub fn to_chart_svg(series: &[Series<'_>], metadata: &ChartMetadata<'_>) -> String {
    let width = f64::from(CHART_WIDTH);
    let height = f64::from(CHART_HEIGHT);
    let ((x_lo, x_hi), (y_lo, y_hi)) = data_bounds(series);
    let x_axis = Axis {
        lo: x_lo,
        hi: x_hi,
        px_lo: MARGIN_LEFT,
        px_hi: width - MARGIN_RIGHT,
    };
    let y_axis = Axis {
        lo: y_lo,
        hi: y_hi,
        px_lo: height - MARGIN_BOTTOM,
        px_hi: MARGIN_TOP,
    };

    let mut doc = Document::new()
        .set("width", CHART_WIDTH)
        .set("height", CHART_HEIGHT)
        .set("viewBox", (0, 0, CHART_WIDTH, CHART_HEIGHT));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    doc = doc.add(
        Rectangle::new()
            .set("width", CHART_WIDTH)
            .set("height", CHART_HEIGHT)
            .set("fill", "white"),
    );

    // Grid lines and tick labels.
    for x in nice_ticks(x_lo, x_hi, 10) {
        let px = x_axis.map(x);
        doc = doc.add(
            Line::new()
                .set("x1", px)
                .set("y1", MARGIN_TOP)
                .set("x2", px)
                .set("y2", height - MARGIN_BOTTOM)
                .set("stroke", "#dddddd"),
        );
        doc = doc.add(text(&format_tick(x), px, height - MARGIN_BOTTOM + 18.0, "middle", 12));
    }
    for y in nice_ticks(y_lo, y_hi, 6) {
        let py = y_axis.map(y);
        doc = doc.add(
            Line::new()
                .set("x1", MARGIN_LEFT)
                .set("y1", py)
                .set("x2", width - MARGIN_RIGHT)
                .set("y2", py)
                .set("stroke", "#dddddd"),
        );
        doc = doc.add(text(&format_tick(y), MARGIN_LEFT - 8.0, py + 4.0, "end", 12));
    }

    // Plot frame.
    doc = doc.add(
        Rectangle::new()
            .set("x", MARGIN_LEFT)
            .set("y", MARGIN_TOP)
            .set("width", width - MARGIN_LEFT - MARGIN_RIGHT)
            .set("height", height - MARGIN_TOP - MARGIN_BOTTOM)
            .set("fill", "none")
            .set("stroke", "black"),
    );

    // Titles and axis labels.
    if let Some(title) = metadata.title {
        doc = doc.add(text(title, width / 2.0, MARGIN_TOP - 14.0, "middle", 16));
    }
    doc = doc.add(text(metadata.x_label, width / 2.0, height - 12.0, "middle", 13));
    let mut y_label = text(metadata.y_label, 0.0, 0.0, "middle", 13);
    y_label.assign(
        "transform",
        format!("translate(18 {}) rotate(-90)", height / 2.0),
    );
    doc = doc.add(y_label);

    // Series lines, markers, and legend entries.
    for (i, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        let mapped: Vec<(f64, f64)> = s
            .points
            .iter()
            .map(|&(x, y)| (x_axis.map(x), y_axis.map(y)))
            .collect();

        if let Some((&first, rest)) = mapped.split_first()
            && !rest.is_empty()
        {
            let mut data = Data::new().move_to(first);
            for &p in rest {
                data = data.line_to(p);
            }
            doc = doc.add(
                Path::new()
                    .set("d", data)
                    .set("fill", "none")
                    .set("stroke", color)
                    .set("stroke-width", 2),
            );
        }
        for &(px, py) in &mapped {
            doc = doc.add(
                Circle::new()
                    .set("cx", px)
                    .set("cy", py)
                    .set("r", 4)
                    .set("fill", color),
            );
        }

        #[allow(clippy::cast_precision_loss)]
        let legend_y = (i as f64).mul_add(20.0, MARGIN_TOP + 20.0);
        let legend_x = width - MARGIN_RIGHT - 260.0;
        doc = doc.add(
            Line::new()
                .set("x1", legend_x)
                .set("y1", legend_y)
                .set("x2", legend_x + 24.0)
                .set("y2", legend_y)
                .set("stroke", color)
                .set("stroke-width", 2),
        );
        doc = doc.add(text(s.label, legend_x + 32.0, legend_y + 4.0, "start", 12));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ChartMetadata<'static> {
        ChartMetadata {
            title: Some("Image Augmentation: Largest to Smallest - 2 Images"),
            description: None,
            x_label: "Process Count",
            y_label: "Process Time (seconds)",
        }
    }

    #[test]
    fn chart_contains_labels_and_legend() {
        let points = [(1.0, 3.5), (2.0, 2.0), (4.0, 1.25)];
        let svg = to_chart_svg(
            &[Series {
                label: "Largest to Smallest - 2 Images",
                points: &points,
            }],
            &meta(),
        );
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains("<title>Image Augmentation: Largest to Smallest - 2 Images</title>"));
        assert!(svg.contains("Process Count"));
        assert!(svg.contains("Process Time (seconds)"));
        assert!(svg.contains(">Largest to Smallest - 2 Images</text>"));
    }

    #[test]
    fn one_marker_per_point() {
        let points = [(1.0, 3.5), (2.0, 2.0), (3.0, 1.5), (4.0, 1.25)];
        let svg = to_chart_svg(
            &[Series {
                label: "run",
                points: &points,
            }],
            &meta(),
        );
        assert_eq!(svg.matches("<circle").count(), 4);
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn single_point_has_marker_but_no_line() {
        let points = [(1.0, 2.0)];
        let svg = to_chart_svg(
            &[Series {
                label: "one",
                points: &points,
            }],
            &meta(),
        );
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn empty_chart_is_valid_svg() {
        let svg = to_chart_svg(&[], &ChartMetadata::default());
        assert!(svg.contains("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 800 500""#));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn labels_are_escaped() {
        let points = [(1.0, 1.0), (2.0, 0.5)];
        let svg = to_chart_svg(
            &[Series {
                label: "a < b & c",
                points: &points,
            }],
            &meta(),
        );
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn nice_ticks_cover_range() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(1.0, 16.0, 10), vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]);
        assert_eq!(nice_ticks(3.0, 3.0, 5), vec![3.0]);
    }

    #[test]
    fn tick_format_trims_zeros() {
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(0.5), "0.5");
        assert_eq!(format_tick(1.25), "1.25");
    }

    #[test]
    fn flat_x_range_is_padded() {
        let points = [(4.0, 1.0)];
        let ((lo, hi), (ylo, yhi)) = data_bounds(&[Series {
            label: "x",
            points: &points,
        }]);
        assert!((lo - 3.0).abs() < f64::EPSILON);
        assert!((hi - 5.0).abs() < f64::EPSILON);
        assert!(ylo.abs() < f64::EPSILON);
        assert!((yhi - 1.1).abs() < 1e-9);
    }
}
