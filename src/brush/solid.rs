use egui::Pos2;

use super::smoothing::{draw_tail, extend_resampled, resample};
use super::BrushKernel;
use crate::pixel_buffer::PixelBuffer;
use crate::raster::{fill_disc, stroke_polyline, CompositeMode, LineCap, Paint};
use crate::stroke::{BrushSettings, StrokeState};

const ROUND_STEP: f32 = 0.5;
const PENCIL_STEP: f32 = 0.3;
const MARKER_ALPHA: f32 = 0.6;

/// Solid round-capped stroke.
#[derive(Debug, Default)]
pub struct RoundKernel;

impl BrushKernel for RoundKernel {
    fn name(&self) -> &'static str {
        "round"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity);
        if stroke.points.is_empty() {
            stroke.points.push(point);
            fill_disc(buffer, point, settings.size / 2.0, &paint);
            return;
        }
        let added = extend_resampled(stroke, point, ROUND_STEP).len();
        draw_tail(buffer, &stroke.points, added, settings.size, LineCap::Round, &paint, settings.smoothing);
    }
}

/// Translucent square-capped stroke that darkens what is underneath.
#[derive(Debug, Default)]
pub struct MarkerKernel;

impl BrushKernel for MarkerKernel {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity * MARKER_ALPHA).with_mode(CompositeMode::Multiply);
        if stroke.points.is_empty() {
            stroke.points.push(point);
            fill_disc(buffer, point, settings.size / 2.0, &paint);
            return;
        }
        let added = extend_resampled(stroke, point, ROUND_STEP).len();
        draw_tail(buffer, &stroke.points, added, settings.size, LineCap::Square, &paint, settings.smoothing);
    }
}

/// Hard-edged stroke made of short straight sub-segments; ignores smoothing.
#[derive(Debug, Default)]
pub struct PencilKernel;

impl BrushKernel for PencilKernel {
    fn name(&self) -> &'static str {
        "pencil"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity);
        let Some(last) = stroke.last_point() else {
            stroke.points.push(point);
            fill_disc(buffer, point, settings.size / 2.0, &paint);
            return;
        };
        let mut prev = last;
        for next in resample(last, point, PENCIL_STEP) {
            stroke_polyline(buffer, &[prev, next], settings.size, LineCap::Round, &paint);
            stroke.points.push(next);
            prev = next;
        }
    }
}
