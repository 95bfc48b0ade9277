use egui::Pos2;

use super::{Tool, ToolContext, ToolKind};
use crate::brush::{BrushKernel, BrushKind, EraserKernel, PencilKernel};
use crate::error::{PaintError, PaintResult};

static PENCIL: PencilKernel = PencilKernel;
static ERASER: EraserKernel = EraserKernel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreehandMode {
    Brush(BrushKind),
    Pencil,
    Eraser,
}

impl FreehandMode {
    pub fn kernel(self) -> &'static dyn BrushKernel {
        match self {
            FreehandMode::Brush(kind) => kind.kernel(),
            FreehandMode::Pencil => &PENCIL,
            FreehandMode::Eraser => &ERASER,
        }
    }
}

/// Brush, pencil and eraser: every pointer sample goes through a kernel.
#[derive(Debug)]
pub struct FreehandTool {
    mode: FreehandMode,
}

impl FreehandTool {
    pub fn new(mode: FreehandMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FreehandMode {
        self.mode
    }

    fn stamp(&self, pos: Pos2, ctx: &mut ToolContext<'_>) {
        ctx.stroke.set_sample_time(ctx.time_ms);
        let buffer = &mut ctx.layers.active_mut().buffer;
        self.mode.kernel().apply(buffer, ctx.stroke, pos, &ctx.brush);
        ctx.stroke.marked = true;
    }
}

impl Tool for FreehandTool {
    fn kind(&self) -> ToolKind {
        match self.mode {
            FreehandMode::Brush(_) => ToolKind::Brush,
            FreehandMode::Pencil => ToolKind::Pencil,
            FreehandMode::Eraser => ToolKind::Eraser,
        }
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) -> PaintResult<()> {
        if ctx.layers.active().locked {
            return Err(PaintError::LayerLocked);
        }
        ctx.stroke.begin(ctx.time_ms);
        log::debug!("🖌️ {} stroke started at {:?}", self.mode.kernel().name(), pos);
        self.stamp(pos, ctx);
        Ok(())
    }

    fn on_pointer_move(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) {
        if !ctx.stroke.is_drawing() {
            return;
        }
        self.stamp(pos, ctx);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let points = ctx.stroke.points().len();
        let changed = ctx.stroke.end();
        log::debug!("🖌️ Stroke finished with {} points", points);
        changed
    }
}
