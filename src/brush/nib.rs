use egui::Pos2;

use super::smoothing::extend_resampled;
use super::BrushKernel;
use crate::pixel_buffer::PixelBuffer;
use crate::raster::{fill_disc, fill_ellipse, Paint};
use crate::stroke::{BrushSettings, StrokeState};

const NIB_STEP: f32 = 0.5;

/// Flat nib held along the direction of travel.
#[derive(Debug, Default)]
pub struct CalligraphyKernel;

impl BrushKernel for CalligraphyKernel {
    fn name(&self) -> &'static str {
        "calligraphy"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity);
        let rx = settings.size / 2.0;
        let ry = settings.size * 0.15;
        let Some(last) = stroke.last_point() else {
            stroke.points.push(point);
            fill_ellipse(buffer, point, rx, ry, 0.0, &paint);
            return;
        };
        let angle = (point.y - last.y).atan2(point.x - last.x);
        for at in extend_resampled(stroke, point, NIB_STEP) {
            fill_ellipse(buffer, at, rx, ry, angle, &paint);
        }
    }
}

/// Ellipse stamps whose size follows pointer speed and whose shape follows direction.
#[derive(Debug, Default)]
pub struct DynamicKernel;

impl DynamicKernel {
    /// Stamp size for a pointer moving at `speed` px/ms.
    pub fn pressure_size(size: f32, speed: f32) -> f32 {
        size * (0.3 + (speed * 50.0).min(0.7))
    }
}

impl BrushKernel for DynamicKernel {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        let paint = Paint::new(settings.color, settings.opacity);
        let Some(last) = stroke.last_point() else {
            stroke.points.push(point);
            stroke.last_draw_time = stroke.sample_time;
            fill_disc(buffer, point, settings.size / 2.0, &paint);
            return;
        };

        stroke.track_motion(last, point);
        let angle = stroke.last_angle;
        let pressure = Self::pressure_size(settings.size, stroke.last_speed);
        let width = pressure * (0.6 + angle.sin().abs() * 0.4);
        let height = pressure * (0.6 + angle.cos().abs() * 0.4);
        for at in extend_resampled(stroke, point, NIB_STEP) {
            fill_ellipse(buffer, at, width / 2.0, height / 2.0, angle, &paint);
        }
    }
}
