use std::f32::consts::TAU;

use egui::{vec2, Pos2};
use rand::Rng;

use super::smoothing::extend_resampled;
use super::BrushKernel;
use crate::pixel_buffer::PixelBuffer;
use crate::raster::{fill_radial_gradient, CompositeMode, GradientStop, Paint};
use crate::stroke::{BrushSettings, StrokeState};

const SOFT_STEP: f32 = 1.0;
const NEON_STEP: f32 = 0.5;
const WATERCOLOR_STEP: f32 = 1.5;

const GLOW_STOPS: [GradientStop; 3] = [
    GradientStop::new(0.0, 1.0),
    GradientStop::new(0.5, 0.5),
    GradientStop::new(1.0, 0.0),
];

const WATERCOLOR_STOPS: [GradientStop; 3] = [
    GradientStop::new(0.0, 0.15),
    GradientStop::new(0.6, 0.08),
    GradientStop::new(1.0, 0.0),
];

/// Radial falloff with radius equal to the brush size.
///
/// The centre is painted at the stroke opacity; the mid stop carries the
/// opacity again, so translucent soft strokes fade faster.
#[derive(Debug, Default)]
pub struct SoftKernel;

fn soft_stops(opacity: f32) -> [GradientStop; 3] {
    [
        GradientStop::new(0.0, 1.0),
        GradientStop::new(0.5, 0.5 * opacity),
        GradientStop::new(1.0, 0.0),
    ]
}

impl BrushKernel for SoftKernel {
    fn name(&self) -> &'static str {
        "soft"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity);
        let stops = soft_stops(settings.opacity);
        let stamps = if stroke.points.is_empty() {
            stroke.points.push(point);
            vec![point]
        } else {
            extend_resampled(stroke, point, SOFT_STEP)
        };
        for at in stamps {
            fill_radial_gradient(buffer, at, settings.size, &stops, &paint);
        }
    }
}

/// Three additive glow rings, widest and faintest first. Ring alpha scales
/// with the square of the stroke opacity.
#[derive(Debug, Default)]
pub struct NeonKernel;

impl NeonKernel {
    fn glow(buffer: &mut PixelBuffer, at: Pos2, settings: &BrushSettings) {
        for ring in (0..=2).rev() {
            let ring = ring as f32;
            let radius = settings.size * (0.5 + ring * 0.3);
            let alpha = settings.opacity * settings.opacity * (0.6 - ring * 0.15);
            let paint = Paint::new(settings.color, alpha).with_mode(CompositeMode::Lighter);
            fill_radial_gradient(buffer, at, radius, &GLOW_STOPS, &paint);
        }
    }
}

impl BrushKernel for NeonKernel {
    fn name(&self) -> &'static str {
        "neon"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        if stroke.points.is_empty() {
            stroke.points.push(point);
            Self::glow(buffer, point, settings);
            return;
        }
        for at in extend_resampled(stroke, point, NEON_STEP) {
            Self::glow(buffer, at, settings);
        }
    }
}

/// Clusters of faint multiplied blobs around the path. Blob alpha scales
/// with the square of the stroke opacity.
#[derive(Debug, Default)]
pub struct WatercolorKernel;

impl WatercolorKernel {
    fn bloom(buffer: &mut PixelBuffer, stroke: &mut StrokeState, at: Pos2, settings: &BrushSettings) {
        let alpha = settings.opacity * settings.opacity;
        let paint = Paint::new(settings.color, alpha).with_mode(CompositeMode::Multiply);
        let blobs: usize = stroke.rng.gen_range(8..13);
        for _ in 0..blobs {
            let angle = stroke.rng.gen_range(0.0..TAU);
            let dist = stroke.rng.gen_range(0.0..=settings.size * 0.8);
            let radius = settings.size * stroke.rng.gen_range(0.5..1.0);
            let centre = at + vec2(angle.cos(), angle.sin()) * dist;
            fill_radial_gradient(buffer, centre, radius, &WATERCOLOR_STOPS, &paint);
        }
    }
}

impl BrushKernel for WatercolorKernel {
    fn name(&self) -> &'static str {
        "watercolor"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        if stroke.points.is_empty() {
            stroke.points.push(point);
            Self::bloom(buffer, stroke, point, settings);
            return;
        }
        for at in extend_resampled(stroke, point, WATERCOLOR_STEP) {
            Self::bloom(buffer, stroke, at, settings);
        }
    }
}
