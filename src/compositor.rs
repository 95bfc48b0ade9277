use egui::{pos2, Color32};

use crate::config::EngineConfig;
use crate::layer::LayerStack;
use crate::pixel_buffer::{PixelBuffer, Rgba8};
use crate::raster::Paint;
use crate::text::{Baseline, TextLayout, TextRenderer};

const BACKGROUND: Rgba8 = [255, 255, 255, 255];
const GRID_COLOR: Rgba8 = [0xe0, 0xe0, 0xe0, 255];
const RULER_BAND_COLOR: Rgba8 = [0xf0, 0xf0, 0xf0, 255];
const RULER_TICK_COLOR: Rgba8 = [0x66, 0x66, 0x66, 255];
const RULER_TICK_LENGTH: u32 = 10;

/// Optional guides drawn under the layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guides {
    pub grid: bool,
    pub ruler: bool,
}

/// Flattens a layer stack into a display frame.
///
/// The frame is an opaque white background, then the enabled guides, then
/// every visible layer bottom to top with its opacity.
#[derive(Debug, Clone)]
pub struct Compositor {
    grid_spacing: u32,
    ruler_size: u32,
    labels: Option<TextRenderer>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Compositor {
    pub fn new(config: &EngineConfig) -> Self {
        let labels = match TextRenderer::builtin() {
            Ok(renderer) => Some(renderer),
            Err(err) => {
                log::warn!("⚠️ Ruler labels disabled: {err}");
                None
            }
        };
        Self {
            grid_spacing: config.grid_spacing.max(1),
            ruler_size: config.ruler_size,
            labels,
        }
    }

    pub fn composite(&self, stack: &LayerStack, guides: Guides) -> PixelBuffer {
        let mut frame = PixelBuffer::filled(stack.width(), stack.height(), BACKGROUND);
        if guides.grid {
            self.draw_grid(&mut frame);
        }
        if guides.ruler {
            self.draw_ruler(&mut frame);
        }
        for layer in stack.layers().iter().filter(|layer| layer.visible) {
            frame.draw_over(&layer.buffer, layer.opacity);
        }
        frame
    }

    fn draw_grid(&self, frame: &mut PixelBuffer) {
        let (w, h) = (frame.width() as i64, frame.height() as i64);
        let step = self.grid_spacing as usize;
        for x in (0..w).step_by(step) {
            for y in 0..h {
                frame.set(x, y, GRID_COLOR);
            }
        }
        for y in (0..h).step_by(step) {
            for x in 0..w {
                frame.set(x, y, GRID_COLOR);
            }
        }
    }

    fn draw_ruler(&self, frame: &mut PixelBuffer) {
        let (w, h) = (frame.width() as i64, frame.height() as i64);
        let band = self.ruler_size as i64;
        for y in 0..h {
            for x in 0..w {
                if x < band || y < band {
                    frame.set(x, y, RULER_BAND_COLOR);
                }
            }
        }
        let step = self.grid_spacing as usize;
        let tick = RULER_TICK_LENGTH as i64;
        for x in (0..w).step_by(step) {
            for y in 0..tick {
                frame.set(x, y, RULER_TICK_COLOR);
            }
        }
        for y in (0..h).step_by(step) {
            for x in 0..tick {
                frame.set(x, y, RULER_TICK_COLOR);
            }
        }
        self.draw_ruler_labels(frame);
    }

    /// Coordinates beside each tick; vertical ones read bottom to top.
    fn draw_ruler_labels(&self, frame: &mut PixelBuffer) {
        let Some(labels) = &self.labels else {
            return;
        };
        let [r, g, b, _] = RULER_TICK_COLOR;
        let paint = Paint::new(Color32::from_rgb(r, g, b), 1.0);
        let band = self.ruler_size as f32;
        let size = band / 2.0;
        let step = self.grid_spacing as usize;
        for x in (0..frame.width()).step_by(step) {
            let layout =
                TextLayout::new(pos2(x as f32 + 2.0, band - 5.0), size).with_baseline(Baseline::Alphabetic);
            labels.draw(frame, &x.to_string(), &layout, &paint);
        }
        for y in (0..frame.height()).step_by(step) {
            let origin = pos2(band / 4.0, y as f32 - 2.0);
            let layout = TextLayout::new(origin, size)
                .with_baseline(Baseline::Alphabetic)
                .rotated(-std::f32::consts::FRAC_PI_2, origin);
            labels.draw(frame, &y.to_string(), &layout, &paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stack_is_white() {
        let stack = LayerStack::new(8, 8);
        let frame = Compositor::default().composite(&stack, Guides::default());
        assert!(frame.as_raw().chunks_exact(4).all(|px| px == BACKGROUND));
    }

    #[test]
    fn test_grid_lines() {
        let stack = LayerStack::new(120, 120);
        let frame = Compositor::default().composite(&stack, Guides { grid: true, ruler: false });
        assert_eq!(frame.get(50, 7), Some(GRID_COLOR));
        assert_eq!(frame.get(7, 100), Some(GRID_COLOR));
        assert_eq!(frame.get(51, 51), Some(BACKGROUND));
    }

    #[test]
    fn test_ruler_bands_and_ticks() {
        let stack = LayerStack::new(120, 120);
        let frame = Compositor::default().composite(&stack, Guides { grid: false, ruler: true });
        assert_eq!(frame.get(70, 15), Some(RULER_BAND_COLOR));
        assert_eq!(frame.get(50, 5), Some(RULER_TICK_COLOR));
        assert_eq!(frame.get(5, 100), Some(RULER_TICK_COLOR));
        assert_eq!(frame.get(70, 70), Some(BACKGROUND));
    }

    #[test]
    fn test_ruler_labels_are_drawn() {
        let stack = LayerStack::new(120, 120);
        let frame = Compositor::default().composite(&stack, Guides { grid: false, ruler: true });
        // "50" right of the tick at x = 50
        let mut horizontal = (52..70).flat_map(|x| (2..16).map(move |y| (x, y)));
        assert!(horizontal.any(|(x, y)| frame.get(x, y) != Some(RULER_BAND_COLOR)));
        // "100" above the tick at y = 100, running upwards
        let mut vertical = (0..6).flat_map(|x| (70..98).map(move |y| (x, y)));
        assert!(vertical.any(|(x, y)| frame.get(x, y) != Some(RULER_BAND_COLOR)));
        // Labels stay inside the bands
        assert_eq!(frame.get(70, 70), Some(BACKGROUND));
    }

    #[test]
    fn test_hidden_layers_are_skipped() {
        let mut stack = LayerStack::new(4, 4);
        stack.active_mut().buffer.fill([255, 0, 0, 255]);
        stack.set_visible(0, false).unwrap();
        let frame = Compositor::default().composite(&stack, Guides::default());
        assert_eq!(frame.get(1, 1), Some(BACKGROUND));
    }
}
