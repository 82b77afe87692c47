//! augbench-export: Pure chart serializers (sans-IO)
//!
//! Converts timing series into output formats. Currently supports an
//! SVG line chart.

pub mod chart;

pub use chart::{CHART_HEIGHT, CHART_WIDTH, ChartMetadata, Series, to_chart_svg};
