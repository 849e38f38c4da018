// processing/summary.rs

use cloud_frame::FrameHeader;

use super::filter::FilterResult;

/// Formats the per-frame summary line, e.g.
/// `time=1714.250, count=2, max_intensity=200.0`.
/// Only called for frames that kept at least one point.
pub fn format_summary(header: &FrameHeader, result: &FilterResult) -> String {
    format!(
        "time={:.3}, count={}, max_intensity={:.1}",
        header.stamp.as_secs_f64(),
        result.count(),
        result.max_intensity
    )
}
