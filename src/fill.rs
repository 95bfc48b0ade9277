use egui::Pos2;

use crate::config::EngineConfig;
use crate::error::{PaintError, PaintResult};
use crate::pixel_buffer::{PixelBuffer, Rgba8};

/// Matching rules for the flood fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillOptions {
    /// Maximum Euclidean RGBA distance from the seed colour
    pub tolerance: f32,
    /// Pixels with alpha below this always match
    pub alpha_threshold: u8,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            tolerance: 100.0,
            alpha_threshold: 200,
        }
    }
}

impl From<&EngineConfig> for FillOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tolerance: config.fill_tolerance,
            alpha_threshold: config.fill_alpha_threshold,
        }
    }
}

impl FillOptions {
    fn matches(&self, sample: &[u8], seed: Rgba8) -> bool {
        if sample[3] < self.alpha_threshold {
            return true;
        }
        let dist_sq: f32 = (0..4)
            .map(|c| {
                let d = sample[c] as f32 - seed[c] as f32;
                d * d
            })
            .sum();
        dist_sq <= self.tolerance * self.tolerance
    }
}

/// Fill colour for a hex colour at an opacity percentage; alpha is `floor(opacity / 100 * 255)`.
pub fn fill_color(rgb: [u8; 3], opacity_percent: f32) -> Rgba8 {
    let alpha = (opacity_percent.clamp(0.0, 100.0) / 100.0 * 255.0).floor() as u8;
    [rgb[0], rgb[1], rgb[2], alpha]
}

/// Scanline flood fill from `seed`, writing `fill` into every connected
/// matching pixel (4-connectivity). Samples are replaced, not blended.
///
/// Returns the number of pixels written; 0 when the seed already has the fill colour.
pub fn flood_fill(buffer: &mut PixelBuffer, seed: Pos2, fill: Rgba8, options: &FillOptions) -> PaintResult<usize> {
    let sx = seed.x.floor();
    let sy = seed.y.floor();
    if !buffer.contains(sx as i64, sy as i64) || !seed.x.is_finite() || !seed.y.is_finite() {
        return Err(PaintError::OutOfBounds { x: seed.x, y: seed.y });
    }

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let (sx, sy) = (sx as usize, sy as usize);
    let data = buffer.samples_mut();

    let at = |x: usize, y: usize| (y * width + x) * 4;
    let start_idx = at(sx, sy);
    let target: Rgba8 = [data[start_idx], data[start_idx + 1], data[start_idx + 2], data[start_idx + 3]];
    if target == fill {
        return Ok(0);
    }

    let mut visited = vec![false; width * height];
    let mut stack = vec![(sx, sy)];
    let mut painted = 0;

    while let Some((x, y)) = stack.pop() {
        if visited[y * width + x] || !options.matches(&data[at(x, y)..], target) {
            continue;
        }

        let mut left = x;
        while left > 0 && options.matches(&data[at(left - 1, y)..], target) {
            left -= 1;
        }
        let mut right = x;
        while right + 1 < width && options.matches(&data[at(right + 1, y)..], target) {
            right += 1;
        }

        for px in left..=right {
            let key = y * width + px;
            if !visited[key] {
                visited[key] = true;
                painted += 1;
            }
            let i = at(px, y);
            data[i..i + 4].copy_from_slice(&fill);

            if y > 0 && !visited[key - width] && options.matches(&data[at(px, y - 1)..], target) {
                stack.push((px, y - 1));
            }
            if y + 1 < height && !visited[key + width] && options.matches(&data[at(px, y + 1)..], target) {
                stack.push((px, y + 1));
            }
        }
    }

    log::debug!("🪣 Flood fill at ({}, {}) wrote {} pixels", sx, sy, painted);
    Ok(painted)
}
