use std::f32::consts::TAU;

use egui::{pos2, Pos2};
use serde::{Deserialize, Serialize};

use super::{Tool, ToolContext, ToolKind};
use crate::error::{PaintError, PaintResult};
use crate::pixel_buffer::PixelBuffer;
use crate::raster::{dash_polyline, stroke_circle, stroke_polyline, LineCap, Paint};
use crate::stroke::BrushSettings;

const DASH_ON: f32 = 5.0;
const DASH_OFF: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Rectangle,
    /// Centred on the press point, radius to the current point
    Circle,
}

/// Drag-out line, rectangle and circle outlines.
///
/// While dragging only a dashed preview is shown; the shape is rasterized
/// into the active layer on release.
#[derive(Debug)]
pub struct ShapeTool {
    shape: ShapeKind,
    drag: Option<(Pos2, Pos2)>,
}

impl ShapeTool {
    pub fn new(shape: ShapeKind) -> Self {
        Self { shape, drag: None }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Press and current pointer positions while dragging.
    pub fn drag(&self) -> Option<(Pos2, Pos2)> {
        self.drag
    }

    /// Outline of the shape as a path; circles are approximated.
    fn outline(&self, start: Pos2, end: Pos2) -> Vec<Pos2> {
        match self.shape {
            ShapeKind::Line => vec![start, end],
            ShapeKind::Rectangle => vec![
                start,
                pos2(end.x, start.y),
                end,
                pos2(start.x, end.y),
                start,
            ],
            ShapeKind::Circle => {
                let radius = start.distance(end);
                let segments = ((TAU * radius / 2.0).ceil() as usize).clamp(16, 720);
                (0..=segments)
                    .map(|i| {
                        let a = TAU * i as f32 / segments as f32;
                        pos2(start.x + radius * a.cos(), start.y + radius * a.sin())
                    })
                    .collect()
            }
        }
    }

    fn rasterize(&self, buffer: &mut PixelBuffer, start: Pos2, end: Pos2, brush: &BrushSettings) {
        let paint = Paint::new(brush.color, brush.opacity);
        match self.shape {
            ShapeKind::Line => stroke_polyline(buffer, &[start, end], brush.size, LineCap::Round, &paint),
            // Square caps give mitred corners on axis-aligned rectangles.
            ShapeKind::Rectangle => {
                stroke_polyline(buffer, &self.outline(start, end), brush.size, LineCap::Square, &paint)
            }
            ShapeKind::Circle => stroke_circle(buffer, start, start.distance(end), brush.size, &paint),
        }
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        match self.shape {
            ShapeKind::Line => ToolKind::Line,
            ShapeKind::Rectangle => ToolKind::Rectangle,
            ShapeKind::Circle => ToolKind::Circle,
        }
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) -> PaintResult<()> {
        if ctx.layers.active().locked {
            return Err(PaintError::LayerLocked);
        }
        self.drag = Some((pos, pos));
        Ok(())
    }

    fn on_pointer_move(&mut self, pos: Pos2, _ctx: &mut ToolContext<'_>) {
        if let Some((_, current)) = self.drag.as_mut() {
            *current = pos;
        }
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some((start, end)) = self.drag.take() else {
            return false;
        };
        self.rasterize(&mut ctx.layers.active_mut().buffer, start, end, &ctx.brush);
        log::debug!("📐 {:?} drawn from {:?} to {:?}", self.shape, start, end);
        true
    }

    fn on_cancel(&mut self, _ctx: &mut ToolContext<'_>) -> bool {
        self.drag = None;
        false
    }

    fn draw_preview(&self, frame: &mut PixelBuffer, brush: &BrushSettings) {
        let Some((start, end)) = self.drag else {
            return;
        };
        let paint = Paint::new(brush.color, brush.opacity);
        for dash in dash_polyline(&self.outline(start, end), DASH_ON, DASH_OFF) {
            stroke_polyline(frame, &dash, brush.size, LineCap::Round, &paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FillOptions;
    use crate::layer::LayerStack;
    use crate::stroke::StrokeState;
    use egui::Color32;

    fn brush() -> BrushSettings {
        BrushSettings {
            color: Color32::BLACK,
            size: 2.0,
            opacity: 1.0,
            smoothing: true,
        }
    }

    fn drag(tool: &mut ShapeTool, layers: &mut LayerStack, from: Pos2, to: Pos2) -> bool {
        let mut stroke = StrokeState::new(Some(0));
        let mut ctx = ToolContext {
            layers,
            stroke: &mut stroke,
            brush: brush(),
            fill_options: FillOptions::default(),
            fill_color: [0, 0, 0, 255],
            time_ms: 0.0,
        };
        tool.on_pointer_down(from, &mut ctx).unwrap();
        tool.on_pointer_move(to, &mut ctx);
        tool.on_pointer_up(&mut ctx)
    }

    #[test]
    fn test_rectangle_outline_only() {
        let mut layers = LayerStack::new(50, 50);
        let mut tool = ShapeTool::new(ShapeKind::Rectangle);
        assert!(drag(&mut tool, &mut layers, pos2(10.0, 10.0), pos2(40.0, 30.0)));
        let buf = &layers.active().buffer;
        assert_eq!(buf.get(25, 9).unwrap()[3], 255);
        assert_eq!(buf.get(39, 20).unwrap()[3], 255);
        assert_eq!(buf.get(25, 20).unwrap()[3], 0);
        assert!(tool.drag().is_none());
    }

    #[test]
    fn test_circle_radius_from_drag() {
        let mut layers = LayerStack::new(50, 50);
        let mut tool = ShapeTool::new(ShapeKind::Circle);
        drag(&mut tool, &mut layers, pos2(25.0, 25.0), pos2(35.0, 25.0));
        let buf = &layers.active().buffer;
        assert_eq!(buf.get(34, 24).unwrap()[3], 255);
        assert_eq!(buf.get(24, 24).unwrap()[3], 0);
    }

    #[test]
    fn test_preview_is_dashed() {
        let mut tool = ShapeTool::new(ShapeKind::Line);
        tool.drag = Some((pos2(0.0, 5.0), pos2(40.0, 5.0)));
        let mut frame = PixelBuffer::new(40, 10);
        tool.draw_preview(&mut frame, &brush());
        assert_eq!(frame.get(2, 4).unwrap()[3], 255);
        assert_eq!(frame.get(8, 4).unwrap()[3], 0);
        assert_eq!(frame.get(12, 4).unwrap()[3], 255);
    }
}
