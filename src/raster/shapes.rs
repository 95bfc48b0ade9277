use egui::{pos2, Pos2, Rect};

use super::geometry::{calculate_bounds, distance_to_line_segment, quadratic_point};
use super::{LineCap, Paint};
use crate::pixel_buffer::PixelBuffer;

/// Alpha at a normalized distance from a gradient centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub alpha: f32,
}

impl GradientStop {
    pub const fn new(offset: f32, alpha: f32) -> Self {
        Self { offset, alpha }
    }
}

/// Pixel rows/columns touched by `rect`, clipped to the buffer.
fn clip(buffer: &PixelBuffer, rect: Rect) -> Option<(i64, i64, i64, i64)> {
    if !rect.is_finite() || rect.is_negative() {
        return None;
    }
    let x0 = (rect.min.x.floor() as i64).max(0);
    let y0 = (rect.min.y.floor() as i64).max(0);
    let x1 = (rect.max.x.ceil() as i64).min(buffer.width() as i64 - 1);
    let y1 = (rect.max.y.ceil() as i64).min(buffer.height() as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some((x0, y0, x1, y1))
}

/// Visit every candidate pixel in `rect` with its centre point.
fn for_each_pixel(buffer: &mut PixelBuffer, rect: Rect, mut f: impl FnMut(&mut PixelBuffer, i64, i64, Pos2)) {
    let Some((x0, y0, x1, y1)) = clip(buffer, rect) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            let centre = pos2(x as f32 + 0.5, y as f32 + 0.5);
            f(buffer, x, y, centre);
        }
    }
}

/// Coverage for a pixel whose centre lies `sdf` outside an edge.
/// Thin shapes are capped so they do not paint at full strength.
#[inline]
fn coverage(sdf: f32, thickness: f32) -> f32 {
    (0.5 - sdf).clamp(0.0, 1.0).min(thickness.clamp(0.0, 1.0))
}

pub fn fill_disc(buffer: &mut PixelBuffer, center: Pos2, radius: f32, paint: &Paint) {
    if radius <= 0.0 || paint.alpha <= 0.0 {
        return;
    }
    let rect = Rect::from_center_size(center, egui::vec2(radius, radius) * 2.0).expand(1.0);
    for_each_pixel(buffer, rect, |buf, x, y, p| {
        let cov = coverage(p.distance(center) - radius, radius * 2.0);
        if cov > 0.0 {
            buf.blend(x, y, paint.rgb, paint.alpha * cov, paint.mode);
        }
    });
}

/// Ellipse with semi-axes `rx`, `ry`, rotated by `rotation` radians.
pub fn fill_ellipse(buffer: &mut PixelBuffer, center: Pos2, rx: f32, ry: f32, rotation: f32, paint: &Paint) {
    if rx <= 0.0 || ry <= 0.0 || paint.alpha <= 0.0 {
        return;
    }
    let reach = rx.max(ry);
    let rect = Rect::from_center_size(center, egui::vec2(reach, reach) * 2.0).expand(1.0);
    let (sin, cos) = rotation.sin_cos();
    let minor = rx.min(ry);
    for_each_pixel(buffer, rect, |buf, x, y, p| {
        let d = p - center;
        let lx = d.x * cos + d.y * sin;
        let ly = -d.x * sin + d.y * cos;
        let n = ((lx / rx).powi(2) + (ly / ry).powi(2)).sqrt();
        let cov = coverage((n - 1.0) * minor, minor * 2.0);
        if cov > 0.0 {
            buf.blend(x, y, paint.rgb, paint.alpha * cov, paint.mode);
        }
    });
}

fn gradient_alpha(stops: &[GradientStop], t: f32) -> f32 {
    let Some(first) = stops.first() else {
        return 0.0;
    };
    if t <= first.offset {
        return first.alpha;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            if span <= 0.0 {
                return b.alpha;
            }
            return a.alpha + (b.alpha - a.alpha) * (t - a.offset) / span;
        }
    }
    stops.last().map_or(0.0, |s| s.alpha)
}

/// Disc whose alpha follows `stops` from the centre (offset 0) to the rim (offset 1).
/// `paint.alpha` scales every stop.
pub fn fill_radial_gradient(buffer: &mut PixelBuffer, center: Pos2, radius: f32, stops: &[GradientStop], paint: &Paint) {
    if radius <= 0.0 || paint.alpha <= 0.0 {
        return;
    }
    let rect = Rect::from_center_size(center, egui::vec2(radius, radius) * 2.0).expand(1.0);
    for_each_pixel(buffer, rect, |buf, x, y, p| {
        let d = p.distance(center);
        let cov = coverage(d - radius, radius * 2.0);
        if cov <= 0.0 {
            return;
        }
        let alpha = gradient_alpha(stops, (d / radius).min(1.0)) * paint.alpha * cov;
        if alpha > 0.0 {
            buf.blend(x, y, paint.rgb, alpha, paint.mode);
        }
    });
}

/// Signed distance from `p` to a stroked segment with half width `hw`.
fn segment_sdf(p: Pos2, a: Pos2, b: Pos2, hw: f32, cap: LineCap) -> f32 {
    match cap {
        LineCap::Round => distance_to_line_segment(p, a, b) - hw,
        LineCap::Square => {
            let v = b - a;
            let len = v.length();
            let dir = if len > 0.0 { v / len } else { egui::vec2(1.0, 0.0) };
            let rel = p - a;
            let along = rel.x * dir.x + rel.y * dir.y;
            let across = (rel.x * dir.y - rel.y * dir.x).abs();
            let outside_along = (-hw - along).max(along - len - hw);
            (across - hw).max(outside_along)
        }
    }
}

/// Stroke connected segments as one shape so overlaps do not double up.
pub fn stroke_polyline(buffer: &mut PixelBuffer, points: &[Pos2], width: f32, cap: LineCap, paint: &Paint) {
    if points.is_empty() || width <= 0.0 || paint.alpha <= 0.0 {
        return;
    }
    let hw = width / 2.0;
    // Square caps reach further out on the diagonal.
    let rect = calculate_bounds(points, hw * std::f32::consts::SQRT_2 + 1.0);
    let single = [points[0], points[0]];
    let points = if points.len() == 1 { &single[..] } else { points };
    for_each_pixel(buffer, rect, |buf, x, y, p| {
        let sdf = points
            .windows(2)
            .map(|seg| segment_sdf(p, seg[0], seg[1], hw, cap))
            .fold(f32::INFINITY, f32::min);
        let cov = coverage(sdf, width);
        if cov > 0.0 {
            buf.blend(x, y, paint.rgb, paint.alpha * cov, paint.mode);
        }
    });
}

/// Flatten and stroke the quadratic curve `p0 -> ctrl -> p2`.
pub fn stroke_quadratic(buffer: &mut PixelBuffer, p0: Pos2, ctrl: Pos2, p2: Pos2, width: f32, cap: LineCap, paint: &Paint) {
    let approx_len = p0.distance(ctrl) + ctrl.distance(p2);
    let segments = (approx_len.ceil() as usize).clamp(2, 64);
    let points: Vec<Pos2> = (0..=segments)
        .map(|i| quadratic_point(p0, ctrl, p2, i as f32 / segments as f32))
        .collect();
    stroke_polyline(buffer, &points, width, cap, paint);
}

/// Circle outline centred on `center`.
pub fn stroke_circle(buffer: &mut PixelBuffer, center: Pos2, radius: f32, width: f32, paint: &Paint) {
    if width <= 0.0 || paint.alpha <= 0.0 {
        return;
    }
    let hw = width / 2.0;
    let reach = radius + hw;
    let rect = Rect::from_center_size(center, egui::vec2(reach, reach) * 2.0).expand(1.0);
    for_each_pixel(buffer, rect, |buf, x, y, p| {
        let cov = coverage((p.distance(center) - radius).abs() - hw, width);
        if cov > 0.0 {
            buf.blend(x, y, paint.rgb, paint.alpha * cov, paint.mode);
        }
    });
}

/// Split a polyline into dashes of `on` length separated by `off` gaps.
pub fn dash_polyline(points: &[Pos2], on: f32, off: f32) -> Vec<Vec<Pos2>> {
    let mut dashes = Vec::new();
    if points.len() < 2 || on <= 0.0 {
        return dashes;
    }
    let mut drawing = true;
    let mut remaining = on;
    let mut current = vec![points[0]];

    for seg in points.windows(2) {
        let (mut a, b) = (seg[0], seg[1]);
        let mut seg_len = a.distance(b);
        while seg_len > 0.0 {
            let step = remaining.min(seg_len);
            let next = a + (b - a) * (step / seg_len);
            if drawing {
                current.push(next);
            }
            remaining -= step;
            seg_len -= step;
            a = next;
            if remaining <= 0.0 {
                if drawing {
                    dashes.push(std::mem::take(&mut current));
                    remaining = off.max(0.0);
                } else {
                    current = vec![a];
                    remaining = on;
                }
                drawing = !drawing;
                if remaining <= 0.0 {
                    // Zero-length gap.
                    drawing = true;
                    current = vec![a];
                    remaining = on;
                }
            }
        }
    }
    if drawing && current.len() > 1 {
        dashes.push(current);
    }
    dashes
}
