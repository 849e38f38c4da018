// processing/filter.rs

use cloud_frame::PointXYZI;
use tracing::instrument;

/// Outcome of one filtering pass. Derived per frame, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterResult {
    /// Kept points, in their original order of appearance.
    pub points: Vec<PointXYZI>,
    /// Maximum intensity among the kept points. Meaningful only when at
    /// least one point was kept; starts at the NEG_INFINITY sentinel.
    pub max_intensity: f32,
}

impl FilterResult {
    pub fn count(&self) -> u32 {
        self.points.len() as u32
    }
}

/// Keeps every point whose intensity reaches the threshold, in a single
/// in-order pass. The caller snapshots the threshold before the pass, so a
/// whole frame is always filtered against one value.
#[instrument(skip_all)]
pub fn filter_by_intensity(
    points: impl Iterator<Item = PointXYZI>,
    threshold: f64,
) -> FilterResult {
    let mut result = FilterResult {
        points: Vec::new(),
        max_intensity: f32::NEG_INFINITY,
    };

    for point in points {
        if point.intensity as f64 >= threshold {
            result.max_intensity = result.max_intensity.max(point.intensity);
            result.points.push(point);
        }
    }

    result
}
