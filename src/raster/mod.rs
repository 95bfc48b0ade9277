//! Anti-aliased rasterization onto [`crate::pixel_buffer::PixelBuffer`]s.
//!
//! Coverage is estimated from the signed distance between a pixel centre and
//! the shape edge, which gives roughly one pixel of smooth falloff.

mod geometry;
mod shapes;

pub use geometry::{calculate_bounds, distance_to_line_segment, midpoint, quadratic_point};
pub use shapes::{
    dash_polyline, fill_disc, fill_ellipse, fill_radial_gradient, stroke_circle, stroke_polyline,
    stroke_quadratic, GradientStop,
};

use egui::Color32;

/// How a source sample is combined with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    Multiply,
    /// Additive blending, clamped per channel
    Lighter,
    /// Removes destination alpha in proportion to the source alpha
    DestinationOut,
}

/// Line end style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Round,
    Square,
}

/// Colour, alpha multiplier and composite mode applied by a draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub rgb: [u8; 3],
    pub alpha: f32,
    pub mode: CompositeMode,
}

impl Paint {
    pub fn new(color: Color32, alpha: f32) -> Self {
        Self {
            rgb: [color.r(), color.g(), color.b()],
            alpha,
            mode: CompositeMode::SourceOver,
        }
    }

    pub fn with_mode(mut self, mode: CompositeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Paint used by erasers: only the alpha matters.
    pub fn erase() -> Self {
        Self {
            rgb: [0, 0, 0],
            alpha: 1.0,
            mode: CompositeMode::DestinationOut,
        }
    }
}

#[inline]
fn to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Blend one straight-alpha RGBA sample in place.
///
/// `dst` must hold at least four bytes. Samples whose resulting alpha is
/// zero are stored as fully transparent black.
pub fn composite_sample(dst: &mut [u8], rgb: [u8; 3], alpha: f32, mode: CompositeMode) {
    let sa = alpha.clamp(0.0, 1.0);
    if sa <= 0.0 || sa.is_nan() {
        return;
    }
    let da = dst[3] as f32 / 255.0;

    if mode == CompositeMode::DestinationOut {
        let out = to_channel(da * (1.0 - sa));
        if out == 0 {
            dst[..4].copy_from_slice(&[0, 0, 0, 0]);
        } else {
            dst[3] = out;
        }
        return;
    }

    let out_a = match mode {
        CompositeMode::Lighter => (sa + da).min(1.0),
        _ => sa + da * (1.0 - sa),
    };
    if out_a <= 0.0 {
        dst[..4].copy_from_slice(&[0, 0, 0, 0]);
        return;
    }

    for c in 0..3 {
        let cs = rgb[c] as f32 / 255.0;
        let cb = dst[c] as f32 / 255.0;
        let premultiplied = match mode {
            CompositeMode::Multiply => {
                sa * (1.0 - da) * cs + sa * da * cs * cb + (1.0 - sa) * da * cb
            }
            CompositeMode::Lighter => (sa * cs + da * cb).min(1.0),
            _ => sa * cs + da * cb * (1.0 - sa),
        };
        dst[c] = to_channel(premultiplied / out_a);
    }
    dst[3] = to_channel(out_a);
    if dst[3] == 0 {
        dst[..3].copy_from_slice(&[0, 0, 0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_over_on_transparent() {
        let mut px = [0u8; 4];
        composite_sample(&mut px, [255, 0, 0], 0.5, CompositeMode::SourceOver);
        assert_eq!(px, [255, 0, 0, 128]);
    }

    #[test]
    fn test_source_over_half_blue_on_red() {
        let mut px = [255u8, 0, 0, 255];
        composite_sample(&mut px, [0, 0, 255], 0.5, CompositeMode::SourceOver);
        assert_eq!(px, [128, 0, 128, 255]);
    }

    #[test]
    fn test_multiply_darkens() {
        let mut px = [200u8, 200, 200, 255];
        composite_sample(&mut px, [100, 100, 100], 1.0, CompositeMode::Multiply);
        assert_eq!(px, [78, 78, 78, 255]);
    }

    #[test]
    fn test_lighter_clamps() {
        let mut px = [200u8, 10, 0, 255];
        composite_sample(&mut px, [200, 10, 0], 1.0, CompositeMode::Lighter);
        assert_eq!(px, [255, 20, 0, 255]);
    }

    #[test]
    fn test_destination_out_clears() {
        let mut px = [10u8, 20, 30, 255];
        composite_sample(&mut px, [0, 0, 0], 1.0, CompositeMode::DestinationOut);
        assert_eq!(px, [0, 0, 0, 0]);

        let mut px = [10u8, 20, 30, 200];
        composite_sample(&mut px, [0, 0, 0], 0.5, CompositeMode::DestinationOut);
        assert_eq!(px, [10, 20, 30, 100]);
    }

    #[test]
    fn test_zero_alpha_is_noop() {
        let mut px = [1u8, 2, 3, 4];
        composite_sample(&mut px, [255, 255, 255], 0.0, CompositeMode::SourceOver);
        assert_eq!(px, [1, 2, 3, 4]);
    }
}
