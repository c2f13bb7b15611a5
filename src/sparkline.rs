//! Sparkline geometry for the recent PM2.5 history.
//!
//! Points span a nominal 0-100 horizontal range and a 0-40 vertical range.
//! The highest sample sits at y=10 so the line keeps a bit of top padding;
//! the lowest sits at y=40.

use serde::Serialize;

/// Number of most recent hourly samples kept for the sparkline.
pub const HISTORY_WINDOW: usize = 12;

const WIDTH: f64 = 100.0;
const BASELINE: f64 = 40.0;
const AMPLITUDE: f64 = 30.0;

/// Normalized polyline plus the bounds it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sparkline {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// `"x,y"` pairs, oldest sample first.
    pub points: Option<Vec<String>>,
}

impl Sparkline {
    /// Points joined with spaces, ready for an SVG `polyline`.
    pub fn polyline(&self) -> Option<String> {
        self.points.as_ref().map(|points| points.join(" "))
    }
}

/// The last [`HISTORY_WINDOW`] samples of a series.
pub fn recent_window(series: &[f64]) -> &[f64] {
    &series[series.len().saturating_sub(HISTORY_WINDOW)..]
}

/// Build a sparkline from samples ordered oldest to newest.
///
/// An empty slice yields no bounds and no points. The vertical range is
/// at least 1, so a flat series lands on the baseline and a spread below 1
/// is drawn at its true scale instead of stretched to the full height.
pub fn build_sparkline(samples: &[f64]) -> Sparkline {
    let Some(min) = samples.iter().copied().reduce(f64::min) else {
        return Sparkline::default();
    };
    let max = samples.iter().copied().reduce(f64::max).unwrap_or(min);

    let range = (max - min).max(1.0);
    let step_x = WIDTH / samples.len().saturating_sub(1).max(1) as f64;

    let points = samples
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let x = index as f64 * step_x;
            let normalized = (value - min) / range;
            let y = BASELINE - normalized * AMPLITUDE;
            format!("{},{}", x, y)
        })
        .collect();

    Sparkline {
        min: Some(min),
        max: Some(max),
        points: Some(points),
    }
}
