use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::raster::{composite_sample, CompositeMode};

/// One straight-alpha RGBA sample
pub type Rgba8 = [u8; 4];

pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// A width x height grid of RGBA samples, row-major, four bytes per pixel.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(color)),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wrap raw RGBA bytes; `None` when the length does not match the size.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(Self::from_image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    pub fn get(&self, x: i64, y: i64) -> Option<Rgba8> {
        if !self.contains(x, y) {
            return None;
        }
        Some(self.image.get_pixel(x as u32, y as u32).0)
    }

    /// Overwrite a sample. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i64, y: i64, color: Rgba8) {
        if self.contains(x, y) {
            self.image.put_pixel(x as u32, y as u32, Rgba(color));
        }
    }

    /// Composite a colour onto one sample. Out-of-range coordinates are ignored.
    pub fn blend(&mut self, x: i64, y: i64, rgb: [u8; 3], alpha: f32, mode: CompositeMode) {
        if !self.contains(x, y) {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        composite_sample(&mut pixel.0, rgb, alpha, mode);
    }

    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    pub fn fill(&mut self, color: Rgba8) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = color;
        }
    }

    pub fn is_blank(&self) -> bool {
        self.image.as_raw().chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Rescale the contents to a new size (bilinear).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to empty size {}x{}", width, height);
            return;
        }
        if width == self.width() && height == self.height() {
            return;
        }
        self.image = imageops::resize(&self.image, width, height, FilterType::Triangle);
    }

    /// Clear, then copy `src` into the top-left corner without scaling.
    /// Whatever does not fit is cropped.
    pub fn draw_at_origin(&mut self, src: &PixelBuffer) {
        self.clear();
        let w = self.width().min(src.width()) as usize;
        let h = self.height().min(src.height()) as usize;
        let dst_stride = self.width() as usize * 4;
        let src_stride = src.width() as usize * 4;
        let dst: &mut [u8] = &mut self.image;
        let data = src.image.as_raw();
        for y in 0..h {
            let d = y * dst_stride;
            let s = y * src_stride;
            dst[d..d + w * 4].copy_from_slice(&data[s..s + w * 4]);
        }
    }

    /// Source-over the whole of `src` onto this buffer with an opacity
    /// multiplier. Buffers of different sizes are aligned at the origin.
    pub fn draw_over(&mut self, src: &PixelBuffer, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let w = self.width().min(src.width()) as usize;
        let h = self.height().min(src.height()) as usize;
        let dst_stride = self.width() as usize * 4;
        let src_stride = src.width() as usize * 4;
        let dst: &mut [u8] = &mut self.image;
        let data = src.image.as_raw();
        for y in 0..h {
            for x in 0..w {
                let s = y * src_stride + x * 4;
                let a = data[s + 3];
                if a == 0 {
                    continue;
                }
                let d = y * dst_stride + x * 4;
                composite_sample(
                    &mut dst[d..d + 4],
                    [data[s], data[s + 1], data[s + 2]],
                    a as f32 / 255.0 * opacity,
                    CompositeMode::SourceOver,
                );
            }
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
