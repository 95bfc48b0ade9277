use egui::Pos2;

use crate::pixel_buffer::PixelBuffer;
use crate::raster::{midpoint, stroke_polyline, stroke_quadratic, LineCap, Paint};
use crate::stroke::StrokeState;

/// Evenly spaced points from `from` (exclusive) to `to` (inclusive),
/// at most `step` apart. Always yields at least one point.
pub fn resample(from: Pos2, to: Pos2, step: f32) -> Vec<Pos2> {
    let steps = ((from.distance(to) / step).ceil() as usize).max(1);
    (1..=steps)
        .map(|i| from.lerp(to, i as f32 / steps as f32))
        .collect()
}

/// Append the resampled path to `point` and return the new points.
/// The stroke must already hold at least one point.
pub(crate) fn extend_resampled(stroke: &mut StrokeState, point: Pos2, step: f32) -> Vec<Pos2> {
    let Some(last) = stroke.last_point() else {
        stroke.points.push(point);
        return vec![point];
    };
    let fresh = resample(last, point, step);
    stroke.points.extend_from_slice(&fresh);
    fresh
}

/// Draw the tail of the stroke that covers the last `added` points.
///
/// Each window of three points `p0, p1, p2` becomes a quadratic from
/// `mid(p0, p1)` through `p1` to `mid(p1, p2)` when smoothing, or the
/// straight segment `p1 -> p2` otherwise.
pub(crate) fn draw_tail(
    buffer: &mut PixelBuffer,
    points: &[Pos2],
    added: usize,
    width: f32,
    cap: LineCap,
    paint: &Paint,
    smoothing: bool,
) {
    let len = points.len();
    if len < 3 {
        return;
    }
    let start = len.saturating_sub(added + 2);
    for i in start..len - 2 {
        let (p0, p1, p2) = (points[i], points[i + 1], points[i + 2]);
        if smoothing {
            stroke_quadratic(buffer, midpoint(p0, p1), p1, midpoint(p1, p2), width, cap, paint);
        } else {
            stroke_polyline(buffer, &[p1, p2], width, cap, paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_resample_spacing() {
        let pts = resample(pos2(0.0, 0.0), pos2(10.0, 0.0), 0.5);
        assert_eq!(pts.len(), 20);
        assert_eq!(pts.last().copied(), Some(pos2(10.0, 0.0)));
        assert!((pts[0].x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_zero_distance_yields_one() {
        let pts = resample(pos2(3.0, 3.0), pos2(3.0, 3.0), 0.5);
        assert_eq!(pts, vec![pos2(3.0, 3.0)]);
    }
}
