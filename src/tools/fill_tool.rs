use egui::Pos2;

use super::{Tool, ToolContext, ToolKind};
use crate::error::PaintResult;
use crate::fill::flood_fill;

/// Bucket fill on pointer press. Works on locked layers too.
#[derive(Debug, Default)]
pub struct FillTool {
    painted: usize,
}

impl FillTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for FillTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Fill
    }

    fn on_pointer_down(&mut self, pos: Pos2, ctx: &mut ToolContext<'_>) -> PaintResult<()> {
        let buffer = &mut ctx.layers.active_mut().buffer;
        self.painted = flood_fill(buffer, pos, ctx.fill_color, &ctx.fill_options)?;
        Ok(())
    }

    fn on_pointer_move(&mut self, _pos: Pos2, _ctx: &mut ToolContext<'_>) {}

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>) -> bool {
        std::mem::take(&mut self.painted) > 0
    }
}
