//! Drawing target for tile images
//!
//! A thin wrapper over an RGBA canvas with a movable origin, so nested
//! nodes can shift where their children land without copying pixels.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::types::PixelRect;

/// An RGBA canvas with a translatable drawing origin
#[derive(Debug, Clone)]
pub struct Surface {
    canvas: RgbaImage,
    origin: (i64, i64),
}

impl Surface {
    /// Creates a fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_image(RgbaImage::new(width, height))
    }

    pub fn from_image(canvas: RgbaImage) -> Self {
        Self {
            canvas,
            origin: (0, 0),
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// Pixel at absolute canvas coordinates
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.canvas.get_pixel_checked(x, y).copied()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    /// Runs `draw` with the origin shifted by `(dx, dy)`, restoring it after.
    pub fn translated<F>(&mut self, dx: i64, dy: i64, draw: F)
    where
        F: FnOnce(&mut Surface),
    {
        let saved = self.origin;
        self.origin = (saved.0 + dx, saved.1 + dy);
        draw(self);
        self.origin = saved;
    }

    /// Copies `src_rect` of `source` to the current origin, stretched to
    /// `dest_width` x `dest_height` with nearest-neighbour sampling and
    /// alpha-composited over what is already there.
    pub fn blit(&mut self, source: &RgbaImage, src_rect: PixelRect, dest_width: u32, dest_height: u32) {
        debug_assert!(
            src_rect.x >= 0
                && src_rect.y >= 0
                && src_rect.x + i64::from(src_rect.width) <= i64::from(source.width())
                && src_rect.y + i64::from(src_rect.height) <= i64::from(source.height()),
            "fragment {:?} outside source image {}x{}",
            src_rect,
            source.width(),
            source.height()
        );

        if src_rect.width == 0 || src_rect.height == 0 || dest_width == 0 || dest_height == 0 {
            return;
        }

        let x = src_rect.x.max(0) as u32;
        let y = src_rect.y.max(0) as u32;
        let fragment = imageops::crop_imm(source, x, y, src_rect.width, src_rect.height).to_image();

        let fragment = if fragment.dimensions() == (dest_width, dest_height) {
            fragment
        } else {
            imageops::resize(&fragment, dest_width, dest_height, FilterType::Nearest)
        };

        imageops::overlay(&mut self.canvas, &fragment, self.origin.0, self.origin.1);
    }
}
