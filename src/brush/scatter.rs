use std::f32::consts::{PI, TAU};

use egui::{vec2, Pos2};
use rand::Rng;

use super::smoothing::extend_resampled;
use super::BrushKernel;
use crate::pixel_buffer::PixelBuffer;
use crate::raster::{fill_disc, Paint};
use crate::stroke::{BrushSettings, StrokeState};

const AIRBRUSH_STEP: f32 = 2.0;
const AIRBRUSH_DENSITY: usize = 50;
const AIRBRUSH_DOT_RADIUS: f32 = 0.8;
const AIRBRUSH_DOT_ALPHA: f32 = 0.05;

const TEXTURED_STEP: f32 = 0.3;

const SPLATTER_STEP: f32 = 3.0;
const SPLATTER_FIRST_DOTS: usize = 5;
/// Upper bound on droplets per step at very high pointer speeds
const SPLATTER_MAX_DOTS: usize = 400;

fn polar(rng: &mut impl Rng, angle_range: std::ops::Range<f32>, max_dist: f32) -> egui::Vec2 {
    let angle = rng.gen_range(angle_range);
    let dist = if max_dist > 0.0 { rng.gen_range(0.0..max_dist) } else { 0.0 };
    vec2(angle.cos(), angle.sin()) * dist
}

/// Soft spray of faint dots within one brush size of the path.
#[derive(Debug, Default)]
pub struct AirbrushKernel;

impl AirbrushKernel {
    fn spray(buffer: &mut PixelBuffer, stroke: &mut StrokeState, at: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity * AIRBRUSH_DOT_ALPHA);
        for _ in 0..AIRBRUSH_DENSITY {
            let offset = polar(&mut stroke.rng, 0.0..TAU, settings.size);
            fill_disc(buffer, at + offset, AIRBRUSH_DOT_RADIUS, &paint);
        }
    }
}

impl BrushKernel for AirbrushKernel {
    fn name(&self) -> &'static str {
        "airbrush"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        if stroke.points.is_empty() {
            stroke.points.push(point);
            Self::spray(buffer, stroke, point, settings);
            return;
        }
        for at in extend_resampled(stroke, point, AIRBRUSH_STEP) {
            Self::spray(buffer, stroke, at, settings);
        }
    }
}

/// Grainy stroke of small particles with random alpha.
#[derive(Debug, Default)]
pub struct TexturedKernel;

impl TexturedKernel {
    fn grain(buffer: &mut PixelBuffer, stroke: &mut StrokeState, at: Pos2, settings: &BrushSettings) {
        let count = (settings.size / 3.0).floor() as usize;
        for _ in 0..count {
            let offset = polar(&mut stroke.rng, 0.0..TAU, settings.size * 0.5);
            let radius = stroke.rng.gen_range(0.5..2.5);
            let alpha = settings.opacity * stroke.rng.gen_range(0.3..0.7);
            fill_disc(buffer, at + offset, radius, &Paint::new(settings.color, alpha));
        }
    }
}

impl BrushKernel for TexturedKernel {
    fn name(&self) -> &'static str {
        "textured"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        if stroke.points.is_empty() {
            stroke.points.push(point);
            Self::grain(buffer, stroke, point, settings);
            return;
        }
        for at in extend_resampled(stroke, point, TEXTURED_STEP) {
            Self::grain(buffer, stroke, at, settings);
        }
    }
}

/// Droplets thrown forward along the motion; faster strokes throw more, further.
#[derive(Debug, Default)]
pub struct SplatterKernel;

impl SplatterKernel {
    fn droplet(buffer: &mut PixelBuffer, stroke: &mut StrokeState, at: Pos2, offset: egui::Vec2, settings: &BrushSettings) {
        let max_radius = settings.size * 0.15;
        let radius = if max_radius > 0.0 { stroke.rng.gen_range(0.0..max_radius) } else { 0.0 };
        let alpha = settings.opacity * stroke.rng.gen_range(0.2..0.7);
        fill_disc(buffer, at + offset, radius, &Paint::new(settings.color, alpha));
    }
}

impl BrushKernel for SplatterKernel {
    fn name(&self) -> &'static str {
        "splatter"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let Some(last) = stroke.last_point() else {
            stroke.points.push(point);
            stroke.last_draw_time = stroke.sample_time;
            for _ in 0..SPLATTER_FIRST_DOTS {
                let offset = polar(&mut stroke.rng, 0.0..TAU, settings.size * 0.5);
                Self::droplet(buffer, stroke, point, offset, settings);
            }
            return;
        };

        let angle_before = stroke.last_angle;
        stroke.track_motion(last, point);
        let angle = stroke.last_angle;
        // Only speed is tracked for splatter; the stored angle stays untouched.
        stroke.last_angle = angle_before;
        let speed = stroke.last_speed;

        let count = ((3.0 + speed * 50.0).floor() as usize).min(SPLATTER_MAX_DOTS);
        let spread = settings.size * (0.5 + speed * 10.0);
        for at in extend_resampled(stroke, point, SPLATTER_STEP) {
            for _ in 0..count {
                let offset = polar(&mut stroke.rng, angle - PI / 2.0..angle + PI / 2.0, spread);
                Self::droplet(buffer, stroke, at, offset, settings);
            }
        }
    }
}
