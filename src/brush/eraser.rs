use egui::Pos2;

use super::BrushKernel;
use crate::pixel_buffer::PixelBuffer;
use crate::raster::{fill_disc, Paint};
use crate::stroke::{BrushSettings, StrokeState};

/// Clears a disc of the brush diameter at each sample, without interpolation.
#[derive(Debug, Default)]
pub struct EraserKernel;

impl BrushKernel for EraserKernel {
    fn name(&self) -> &'static str {
        "eraser"
    }

    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings) {
        stroke.points.push(point);
        fill_disc(buffer, point, settings.size / 2.0, &Paint::erase());
    }
}
