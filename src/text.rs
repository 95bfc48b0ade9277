//! Glyph rasterization for committed text and ruler labels.
//!
//! Text is laid out on a single line, rasterized into a coverage mask with
//! `ab_glyph`, and the mask is then blended into a [`PixelBuffer`], rotated
//! about a pivot when needed.

use std::borrow::Cow;

use ab_glyph::{point, Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use egui::{Pos2, Rect, Vec2, pos2};

use crate::error::{PaintError, PaintResult};
use crate::pixel_buffer::PixelBuffer;
use crate::raster::Paint;

/// Face from egui's bundled fonts used when no other font is supplied.
const BUILTIN_FONT: &str = "Ubuntu-Light";

/// What the vertical coordinate of a text origin refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    /// Top of the em box
    #[default]
    Top,
    /// The alphabetic baseline
    Alphabetic,
}

/// Placement of one line of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub origin: Pos2,
    /// Em size in pixels
    pub size: f32,
    pub baseline: Baseline,
    /// Clockwise rotation in radians
    pub rotation: f32,
    pub pivot: Pos2,
}

impl TextLayout {
    pub fn new(origin: Pos2, size: f32) -> Self {
        Self {
            origin,
            size,
            baseline: Baseline::Top,
            rotation: 0.0,
            pivot: origin,
        }
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn rotated(mut self, rotation: f32, pivot: Pos2) -> Self {
        self.rotation = rotation;
        self.pivot = pivot;
        self
    }
}

/// Rasterizes text with one font face.
#[derive(Clone)]
pub struct TextRenderer {
    font: FontArc,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl TextRenderer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Load a TrueType or OpenType font from file bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> PaintResult<Self> {
        FontArc::try_from_vec(bytes)
            .map(Self::new)
            .map_err(|err| PaintError::InvalidInput(format!("font: {err}")))
    }

    /// The sans-serif face bundled with egui.
    pub fn builtin() -> PaintResult<Self> {
        let definitions = egui::FontDefinitions::default();
        let data = definitions
            .font_data
            .get(BUILTIN_FONT)
            .ok_or_else(|| PaintError::InvalidInput(format!("font '{BUILTIN_FONT}' is not bundled")))?;
        let font = match &data.font {
            Cow::Borrowed(bytes) => FontArc::try_from_slice(*bytes),
            Cow::Owned(bytes) => FontArc::try_from_vec(bytes.clone()),
        };
        font.map(Self::new)
            .map_err(|err| PaintError::InvalidInput(format!("font: {err}")))
    }

    /// Pixel scale for an em size, as CSS font sizes are specified.
    fn scale(&self, size: f32) -> PxScale {
        let units = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(size * self.font.height_unscaled() / units)
    }

    /// Advance width of `text` at em size `size`.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale(size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Blend `text` into `buffer`. Returns the number of pixels touched.
    pub fn draw(&self, buffer: &mut PixelBuffer, text: &str, layout: &TextLayout, paint: &Paint) -> usize {
        let Some(mask) = self.coverage(text, layout) else {
            return 0;
        };
        if layout.rotation.abs() < f32::EPSILON {
            mask.blend_into(buffer, paint)
        } else {
            mask.blend_rotated(buffer, layout.rotation, layout.pivot, paint)
        }
    }

    fn coverage(&self, text: &str, layout: &TextLayout) -> Option<CoverageMask> {
        if layout.size <= 0.0 || !layout.size.is_finite() {
            return None;
        }
        let scale = self.scale(layout.size);
        let scaled = self.font.as_scaled(scale);
        let baseline_y = match layout.baseline {
            Baseline::Top => layout.origin.y + scaled.ascent(),
            Baseline::Alphabetic => layout.origin.y,
        };

        let mut outlines: Vec<OutlinedGlyph> = Vec::new();
        let mut x = layout.origin.x;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(x, baseline_y));
            if let Some(outline) = self.font.outline_glyph(glyph) {
                outlines.push(outline);
            }
            x += scaled.h_advance(id);
            previous = Some(id);
        }

        let bounds = outlines.iter().map(|outline| outline.px_bounds()).reduce(|a, b| {
            ab_glyph::Rect {
                min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
                max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
            }
        })?;
        let x0 = bounds.min.x.floor() as i64;
        let y0 = bounds.min.y.floor() as i64;
        let width = (bounds.max.x.ceil() as i64 - x0).max(0) as usize;
        let height = (bounds.max.y.ceil() as i64 - y0).max(0) as usize;
        if width == 0 || height == 0 {
            return None;
        }

        let mut mask = CoverageMask {
            x0,
            y0,
            width,
            height,
            coverage: vec![0.0; width * height],
        };
        for outline in &outlines {
            let glyph_bounds = outline.px_bounds();
            let gx0 = glyph_bounds.min.x as i64 - x0;
            let gy0 = glyph_bounds.min.y as i64 - y0;
            outline.draw(|gx, gy, c| {
                mask.accumulate(gx0 + gx as i64, gy0 + gy as i64, c);
            });
        }
        Some(mask)
    }
}

/// Per-pixel glyph coverage over an axis-aligned rectangle.
struct CoverageMask {
    x0: i64,
    y0: i64,
    width: usize,
    height: usize,
    coverage: Vec<f32>,
}

impl CoverageMask {
    fn accumulate(&mut self, x: i64, y: i64, c: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let cell = &mut self.coverage[y as usize * self.width + x as usize];
        *cell = (*cell + c).min(1.0);
    }

    fn at(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.coverage[y as usize * self.width + x as usize]
    }

    /// Bilinear sample at buffer coordinates.
    fn sample(&self, p: Pos2) -> f32 {
        let fx = p.x - self.x0 as f32 - 0.5;
        let fy = p.y - self.y0 as f32 - 0.5;
        let (ix, iy) = (fx.floor() as i64, fy.floor() as i64);
        let (tx, ty) = (fx - fx.floor(), fy - fy.floor());
        let top = self.at(ix, iy) * (1.0 - tx) + self.at(ix + 1, iy) * tx;
        let bottom = self.at(ix, iy + 1) * (1.0 - tx) + self.at(ix + 1, iy + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    fn rect(&self) -> Rect {
        Rect::from_min_size(
            pos2(self.x0 as f32, self.y0 as f32),
            Vec2::new(self.width as f32, self.height as f32),
        )
    }

    fn blend_into(&self, buffer: &mut PixelBuffer, paint: &Paint) -> usize {
        let mut touched = 0;
        for row in 0..self.height {
            for col in 0..self.width {
                let c = self.coverage[row * self.width + col];
                let (x, y) = (self.x0 + col as i64, self.y0 + row as i64);
                if c > 0.0 && buffer.contains(x, y) {
                    buffer.blend(x, y, paint.rgb, c * paint.alpha, paint.mode);
                    touched += 1;
                }
            }
        }
        touched
    }

    fn blend_rotated(&self, buffer: &mut PixelBuffer, rotation: f32, pivot: Pos2, paint: &Paint) -> usize {
        let (sin, cos) = rotation.sin_cos();
        let rotate = |p: Pos2, sin: f32| {
            let v = p - pivot;
            pivot + Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
        };
        let rect = self.rect();
        let corners = [rect.left_top(), rect.right_top(), rect.left_bottom(), rect.right_bottom()]
            .map(|corner| rotate(corner, sin));
        let bounds = Rect::from_points(&corners);

        let x_start = (bounds.min.x.floor() as i64).max(0);
        let y_start = (bounds.min.y.floor() as i64).max(0);
        let x_end = (bounds.max.x.ceil() as i64).min(buffer.width() as i64);
        let y_end = (bounds.max.y.ceil() as i64).min(buffer.height() as i64);

        let mut touched = 0;
        for y in y_start..y_end {
            for x in x_start..x_end {
                let centre = pos2(x as f32 + 0.5, y as f32 + 0.5);
                let c = self.sample(rotate(centre, -sin));
                if c > 0.0 {
                    buffer.blend(x, y, paint.rgb, c * paint.alpha, paint.mode);
                    touched += 1;
                }
            }
        }
        touched
    }
}
