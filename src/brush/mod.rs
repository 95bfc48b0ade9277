//! Freehand brush kernels.
//!
//! A kernel turns one pointer sample into marks on the active layer. The
//! first sample of a stroke stamps a single mark at the pointer. Later
//! samples interpolate from the previous stroke point in kernel-specific
//! steps so fast motion leaves no gaps.

mod eraser;
mod glow;
mod nib;
mod scatter;
mod smoothing;
mod solid;

pub use eraser::EraserKernel;
pub use glow::{NeonKernel, SoftKernel, WatercolorKernel};
pub use nib::{CalligraphyKernel, DynamicKernel};
pub use scatter::{AirbrushKernel, SplatterKernel, TexturedKernel};
pub use smoothing::resample;
pub use solid::{MarkerKernel, PencilKernel, RoundKernel};

use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PaintError;
use crate::pixel_buffer::PixelBuffer;
use crate::stroke::{BrushSettings, StrokeState};

/// A freehand mark-making algorithm.
pub trait BrushKernel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply one pointer sample at `point`, extending the stroke in `stroke`.
    fn apply(&self, buffer: &mut PixelBuffer, stroke: &mut StrokeState, point: Pos2, settings: &BrushSettings);
}

/// The selectable brush kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    #[default]
    Round,
    Airbrush,
    Calligraphy,
    Marker,
    Soft,
    Dynamic,
    Textured,
    Splatter,
    Neon,
    Watercolor,
}

static ROUND: RoundKernel = RoundKernel;
static AIRBRUSH: AirbrushKernel = AirbrushKernel;
static CALLIGRAPHY: CalligraphyKernel = CalligraphyKernel;
static MARKER: MarkerKernel = MarkerKernel;
static SOFT: SoftKernel = SoftKernel;
static DYNAMIC: DynamicKernel = DynamicKernel;
static TEXTURED: TexturedKernel = TexturedKernel;
static SPLATTER: SplatterKernel = SplatterKernel;
static NEON: NeonKernel = NeonKernel;
static WATERCOLOR: WatercolorKernel = WatercolorKernel;

impl BrushKind {
    pub const ALL: [BrushKind; 10] = [
        BrushKind::Round,
        BrushKind::Airbrush,
        BrushKind::Calligraphy,
        BrushKind::Marker,
        BrushKind::Soft,
        BrushKind::Dynamic,
        BrushKind::Textured,
        BrushKind::Splatter,
        BrushKind::Neon,
        BrushKind::Watercolor,
    ];

    pub fn kernel(self) -> &'static dyn BrushKernel {
        match self {
            BrushKind::Round => &ROUND,
            BrushKind::Airbrush => &AIRBRUSH,
            BrushKind::Calligraphy => &CALLIGRAPHY,
            BrushKind::Marker => &MARKER,
            BrushKind::Soft => &SOFT,
            BrushKind::Dynamic => &DYNAMIC,
            BrushKind::Textured => &TEXTURED,
            BrushKind::Splatter => &SPLATTER,
            BrushKind::Neon => &NEON,
            BrushKind::Watercolor => &WATERCOLOR,
        }
    }

    pub fn name(self) -> &'static str {
        self.kernel().name()
    }
}

impl FromStr for BrushKind {
    type Err = PaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BrushKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| PaintError::InvalidInput(format!("unknown brush '{s}'")))
    }
}

impl std::fmt::Display for BrushKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
