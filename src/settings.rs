use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::brush::BrushKind;
use crate::error::{PaintError, PaintResult};
use crate::stroke::BrushSettings;
use crate::tools::ToolKind;

pub const MIN_BRUSH_SIZE: f32 = 1.0;
pub const MAX_BRUSH_SIZE: f32 = 100.0;

/// Current tool and brush settings, as edited by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub brush: BrushKind,
    /// `#rrggbb`
    pub color: String,
    /// Brush diameter in pixels
    pub brush_size: f32,
    /// Opacity percentage, 0 to 100
    pub opacity: f32,
    pub smoothing: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::Brush,
            brush: BrushKind::Round,
            color: "#000000".to_string(),
            brush_size: 5.0,
            opacity: 100.0,
            smoothing: true,
        }
    }
}

impl ToolSettings {
    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> PaintResult<()> {
        parse_hex_color(&self.color)?;
        if !(MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE).contains(&self.brush_size) {
            return Err(PaintError::InvalidInput(format!(
                "brush size {} outside {}..={}",
                self.brush_size, MIN_BRUSH_SIZE, MAX_BRUSH_SIZE
            )));
        }
        if !(0.0..=100.0).contains(&self.opacity) {
            return Err(PaintError::InvalidInput(format!("opacity {} outside 0..=100", self.opacity)));
        }
        Ok(())
    }

    pub fn color32(&self) -> PaintResult<Color32> {
        parse_hex_color(&self.color)
    }

    /// Kernel parameters derived from these settings.
    pub fn brush_settings(&self) -> PaintResult<BrushSettings> {
        Ok(BrushSettings {
            color: self.color32()?,
            size: self.brush_size,
            opacity: self.opacity / 100.0,
            smoothing: self.smoothing,
        })
    }
}

/// Parse `#rrggbb` (the `#` is optional).
pub fn parse_hex_color(hex: &str) -> PaintResult<Color32> {
    let digits = hex.trim().trim_start_matches('#');
    let invalid = || PaintError::InvalidInput(format!("invalid colour '{hex}'"));
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Format as lowercase `#rrggbb`.
pub fn to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}
