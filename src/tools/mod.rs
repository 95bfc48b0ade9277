mod fill_tool;
mod freehand_tool;
mod shape_tool;

pub use fill_tool::FillTool;
pub use freehand_tool::{FreehandMode, FreehandTool};
pub use shape_tool::{ShapeKind, ShapeTool};

use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::brush::BrushKind;
use crate::error::{PaintError, PaintResult};
use crate::fill::FillOptions;
use crate::layer::LayerStack;
use crate::pixel_buffer::{PixelBuffer, Rgba8};
use crate::stroke::{BrushSettings, StrokeState};

/// Every selectable tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Brush,
    Pencil,
    Eraser,
    Fill,
    Eyedropper,
    Line,
    Rectangle,
    Circle,
    Pan,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Brush,
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Fill,
        ToolKind::Eyedropper,
        ToolKind::Line,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Pan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Brush => "brush",
            ToolKind::Pencil => "pencil",
            ToolKind::Eraser => "eraser",
            ToolKind::Fill => "fill",
            ToolKind::Eyedropper => "eyedropper",
            ToolKind::Line => "line",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Pan => "pan",
        }
    }

    /// Tools that paint with a brush kernel while the pointer moves.
    pub fn is_freehand(self) -> bool {
        matches!(self, ToolKind::Brush | ToolKind::Pencil | ToolKind::Eraser)
    }

    /// Tools that drag out a geometric shape.
    pub fn is_shape(self) -> bool {
        matches!(self, ToolKind::Line | ToolKind::Rectangle | ToolKind::Circle)
    }
}

impl FromStr for ToolKind {
    type Err = PaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| PaintError::InvalidInput(format!("unknown tool '{s}'")))
    }
}

/// Everything a tool may read or modify while handling a gesture.
pub struct ToolContext<'a> {
    pub layers: &'a mut LayerStack,
    pub stroke: &'a mut StrokeState,
    pub brush: BrushSettings,
    pub fill_options: FillOptions,
    pub fill_color: Rgba8,
    /// Timestamp of the pointer sample being handled (ms)
    pub time_ms: f64,
}

/// A pointer-driven tool that edits the active layer.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Start a gesture at `pos`.
    fn on_pointer_down(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) -> PaintResult<()>;

    /// Continue the gesture.
    fn on_pointer_move(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>);

    /// Finish the gesture. Returns true if the active layer changed.
    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool;

    /// Abandon the gesture. Returns true if the active layer had already changed.
    fn on_cancel(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        self.on_pointer_up(ctx)
    }

    /// Draw transient feedback (not part of any layer) onto a display frame.
    fn draw_preview(&self, _frame: &mut PixelBuffer, _brush: &BrushSettings) {}
}

/// The concrete tool driving the current gesture.
#[derive(Debug)]
pub enum ToolType {
    Freehand(FreehandTool),
    Fill(FillTool),
    Shape(ShapeTool),
}

impl ToolType {
    /// Tool instance for a layer-editing tool kind; `None` for eyedropper and pan.
    pub fn for_kind(kind: ToolKind, brush: BrushKind) -> Option<Self> {
        let tool = match kind {
            ToolKind::Brush => ToolType::Freehand(FreehandTool::new(FreehandMode::Brush(brush))),
            ToolKind::Pencil => ToolType::Freehand(FreehandTool::new(FreehandMode::Pencil)),
            ToolKind::Eraser => ToolType::Freehand(FreehandTool::new(FreehandMode::Eraser)),
            ToolKind::Fill => ToolType::Fill(FillTool::new()),
            ToolKind::Line => ToolType::Shape(ShapeTool::new(ShapeKind::Line)),
            ToolKind::Rectangle => ToolType::Shape(ShapeTool::new(ShapeKind::Rectangle)),
            ToolKind::Circle => ToolType::Shape(ShapeTool::new(ShapeKind::Circle)),
            ToolKind::Eyedropper | ToolKind::Pan => return None,
        };
        Some(tool)
    }
}

impl Tool for ToolType {
    fn kind(&self) -> ToolKind {
        match self {
            ToolType::Freehand(tool) => tool.kind(),
            ToolType::Fill(tool) => tool.kind(),
            ToolType::Shape(tool) => tool.kind(),
        }
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) -> PaintResult<()> {
        match self {
            ToolType::Freehand(tool) => tool.on_pointer_down(pos, ctx),
            ToolType::Fill(tool) => tool.on_pointer_down(pos, ctx),
            ToolType::Shape(tool) => tool.on_pointer_down(pos, ctx),
        }
    }

    fn on_pointer_move(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) {
        match self {
            ToolType::Freehand(tool) => tool.on_pointer_move(pos, ctx),
            ToolType::Fill(tool) => tool.on_pointer_move(pos, ctx),
            ToolType::Shape(tool) => tool.on_pointer_move(pos, ctx),
        }
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        match self {
            ToolType::Freehand(tool) => tool.on_pointer_up(ctx),
            ToolType::Fill(tool) => tool.on_pointer_up(ctx),
            ToolType::Shape(tool) => tool.on_pointer_up(ctx),
        }
    }

    fn on_cancel(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        match self {
            ToolType::Freehand(tool) => tool.on_cancel(ctx),
            ToolType::Fill(tool) => tool.on_cancel(ctx),
            ToolType::Shape(tool) => tool.on_cancel(ctx),
        }
    }

    fn draw_preview(&self, frame: &mut PixelBuffer, brush: &BrushSettings) {
        match self {
            ToolType::Freehand(tool) => tool.draw_preview(frame, brush),
            ToolType::Fill(tool) => tool.draw_preview(frame, brush),
            ToolType::Shape(tool) => tool.draw_preview(frame, brush),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_parse() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.name().parse::<ToolKind>().unwrap(), kind);
        }
        assert!("lasso".parse::<ToolKind>().is_err());
    }

    #[test]
    fn test_pointer_tools_have_no_layer_tool() {
        assert!(ToolType::for_kind(ToolKind::Eyedropper, BrushKind::Round).is_none());
        assert!(ToolType::for_kind(ToolKind::Pan, BrushKind::Round).is_none());
        let tool = ToolType::for_kind(ToolKind::Circle, BrushKind::Round);
        assert_eq!(tool.map(|t| t.kind()), Some(ToolKind::Circle));
    }
}
