//! The tile image tree
//!
//! A tile image is an immutable expression tree over a closed set of node
//! kinds. Leaves hold pixels; composites stack, shift or select between
//! their children. Children are shared through `Arc`, so realizing a tree
//! against a context only allocates the nodes that actually change.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use log::debug;
use thiserror::Error;

use super::condition::DrawContext;
use super::surface::Surface;
use super::switch_image::{Animation, SwitchImage};
use super::types::{to_pixels, FragmentRect, Size};

/// Structural errors raised while composing tile images
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileImageError {
    #[error("cannot layer images of differing standard sizes ({below} below, {above} above)")]
    SizeMismatch { below: Size, above: Size },
    #[error("switch image has no cases")]
    EmptySwitch,
    #[error("the last case of a switch image must be the always-true default")]
    MissingDefault,
    #[error("animation has no frames")]
    EmptyAnimation,
    #[error("animation frame durations add up to more than {max} ticks", max = u64::MAX)]
    PeriodOverflow,
    #[error("all variants of a tile image must share one standard size (expected {expected}, found {found})")]
    VariantSizeMismatch { expected: Size, found: Size },
}

/// Raw pixels of a tile sheet, authored at `basis_size` pixels per cell
#[derive(Clone)]
pub struct SourceImage {
    pub pixels: Arc<RgbaImage>,
    pub basis_size: u32,
}

impl SourceImage {
    pub fn new(pixels: Arc<RgbaImage>, basis_size: u32) -> Self {
        Self { pixels, basis_size }
    }

    fn draw_fragment(&self, surface: &mut Surface, rect: FragmentRect) {
        let src = rect.scaled(self.basis_size);
        surface.blit(&self.pixels, src, src.width, src.height);
    }
}

impl PartialEq for SourceImage {
    fn eq(&self, other: &Self) -> bool {
        self.basis_size == other.basis_size
            && (Arc::ptr_eq(&self.pixels, &other.pixels) || *self.pixels == *other.pixels)
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("dimensions", &self.pixels.dimensions())
            .field("basis_size", &self.basis_size)
            .finish()
    }
}

/// A source image redrawn at a different cell size
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSourceImage {
    pub source: SourceImage,
    pub target_size: u32,
}

impl ScaledSourceImage {
    pub fn new(source: SourceImage, target_size: u32) -> Self {
        Self {
            source,
            target_size,
        }
    }

    fn draw_fragment(&self, surface: &mut Surface, rect: FragmentRect) {
        let src = rect.scaled(self.source.basis_size);
        let dest = rect.scaled(self.target_size);
        surface.blit(&self.source.pixels, src, dest.width, dest.height);
    }
}

/// A child image viewed through a shifted crop window, optionally
/// spilling into the neighbouring cells to the north and east.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub source: Arc<TileImage>,
    /// Crop window shift, in standard units
    pub offset_x: i32,
    pub offset_y: i32,
    /// How far the drawn fragment extends above the cell, in standard units
    pub overlap_north: u32,
    /// How far the drawn fragment extends right of the cell, in standard units
    pub overlap_east: u32,
}

impl Sprite {
    pub fn new(source: Arc<TileImage>) -> Self {
        Self {
            source,
            offset_x: 0,
            offset_y: 0,
            overlap_north: 0,
            overlap_east: 0,
        }
    }

    pub fn at(mut self, offset_x: i32, offset_y: i32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn with_overlap(mut self, overlap_north: u32, overlap_east: u32) -> Self {
        self.overlap_north = overlap_north;
        self.overlap_east = overlap_east;
        self
    }

    /// The same crop window and overlap applied to another child
    pub fn with_source(&self, source: Arc<TileImage>) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    fn target_size(&self) -> u32 {
        self.source.size().width
    }

    fn draw_fragment(&self, surface: &mut Surface, rect: FragmentRect) {
        let lift = to_pixels(self.overlap_north, self.target_size());
        let inner = FragmentRect::new(
            rect.x + self.offset_x,
            rect.y + self.offset_y - self.overlap_north as i32,
            rect.width + self.overlap_east,
            rect.height + self.overlap_north,
        );
        surface.translated(0, -i64::from(lift), |s| self.source.draw_fragment(s, inner));
    }

    fn bounds(&self) -> Size {
        let b = self.source.bounds();
        if self.overlap_north == 0 && self.overlap_east == 0 {
            return b;
        }
        let target = self.target_size();
        Size::new(
            b.width + to_pixels(self.overlap_east, target),
            b.height + to_pixels(self.overlap_north, target),
        )
    }
}

/// Two images of the same standard size drawn one over the other
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub below: Arc<TileImage>,
    pub above: Arc<TileImage>,
}

impl Layer {
    pub fn new(below: Arc<TileImage>, above: Arc<TileImage>) -> Result<Self, TileImageError> {
        let (below_size, above_size) = (below.size(), above.size());
        if below_size != above_size {
            return Err(TileImageError::SizeMismatch {
                below: below_size,
                above: above_size,
            });
        }
        Ok(Self { below, above })
    }

    /// Builds a layer from children whose sizes already agree
    pub(crate) fn joined(below: Arc<TileImage>, above: Arc<TileImage>) -> Self {
        debug_assert_eq!(below.size(), above.size());
        Self { below, above }
    }
}

/// A node of the tile image tree
#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    Source(SourceImage),
    Scaled(ScaledSourceImage),
    Sprite(Sprite),
    Layer(Layer),
    Switch(SwitchImage),
    Animation(Animation),
}

impl TileImage {
    pub fn source(pixels: Arc<RgbaImage>, basis_size: u32) -> Arc<TileImage> {
        Arc::new(TileImage::Source(SourceImage::new(pixels, basis_size)))
    }

    pub fn scaled(pixels: Arc<RgbaImage>, basis_size: u32, target_size: u32) -> Arc<TileImage> {
        Arc::new(TileImage::Scaled(ScaledSourceImage::new(
            SourceImage::new(pixels, basis_size),
            target_size,
        )))
    }

    pub fn layer(below: Arc<TileImage>, above: Arc<TileImage>) -> Result<Arc<TileImage>, TileImageError> {
        Ok(Arc::new(TileImage::Layer(Layer::new(below, above)?)))
    }

    /// Draws `rect` of this image, in standard units, at the surface origin.
    ///
    /// The caller must keep `rect` within the image's bounds; reads outside
    /// the source pixels are caught by debug assertions only.
    pub fn draw_fragment(&self, surface: &mut Surface, rect: FragmentRect) {
        match self {
            TileImage::Source(src) => src.draw_fragment(surface, rect),
            TileImage::Scaled(scaled) => scaled.draw_fragment(surface, rect),
            TileImage::Sprite(sprite) => sprite.draw_fragment(surface, rect),
            TileImage::Layer(layer) => {
                layer.below.draw_fragment(surface, rect);
                layer.above.draw_fragment(surface, rect);
            }
            TileImage::Switch(sw) => {
                debug!("drawing an unrealized switch image, using its default case");
                sw.default_image().draw_fragment(surface, rect);
            }
            TileImage::Animation(anim) => {
                debug!("drawing an unrealized animation, using its last frame");
                anim.default_image().draw_fragment(surface, rect);
            }
        }
    }

    /// Draws one standard cell of this image with its top-left at `(x, y)`
    pub fn draw_to(&self, surface: &mut Surface, x: i64, y: i64) {
        surface.translated(x, y, |s| self.draw_fragment(s, FragmentRect::cell()));
    }

    /// Distance between adjacent tiles when this image is laid on the grid
    pub fn size(&self) -> Size {
        match self {
            TileImage::Source(src) => Size::square(src.basis_size),
            TileImage::Scaled(scaled) => Size::square(scaled.target_size),
            TileImage::Sprite(sprite) => sprite.source.size(),
            TileImage::Layer(layer) => layer.below.size(),
            TileImage::Switch(sw) => sw.default_image().size(),
            TileImage::Animation(anim) => anim.default_image().size(),
        }
    }

    /// The true pixel footprint, including any overlap into neighbours
    pub fn bounds(&self) -> Size {
        match self {
            TileImage::Source(_) | TileImage::Scaled(_) => self.size(),
            TileImage::Sprite(sprite) => sprite.bounds(),
            TileImage::Layer(layer) => layer.below.bounds().max(layer.above.bounds()),
            TileImage::Switch(sw) => sw.default_image().bounds(),
            TileImage::Animation(anim) => anim.default_image().bounds(),
        }
    }

    /// Resolves every switch and animation for the given context.
    ///
    /// Returns `self` unchanged when nothing below it depends on the context.
    pub fn realize(self: &Arc<Self>, dc: &DrawContext<'_>) -> Arc<TileImage> {
        match &**self {
            TileImage::Source(_) | TileImage::Scaled(_) => Arc::clone(self),
            TileImage::Sprite(sprite) => {
                let source = sprite.source.realize(dc);
                if Arc::ptr_eq(&source, &sprite.source) {
                    return Arc::clone(self);
                }
                Arc::new(TileImage::Sprite(sprite.with_source(source)))
            }
            TileImage::Layer(layer) => {
                let below = layer.below.realize(dc);
                let above = layer.above.realize(dc);
                if Arc::ptr_eq(&below, &layer.below) && Arc::ptr_eq(&above, &layer.above) {
                    return Arc::clone(self);
                }
                Arc::new(TileImage::Layer(Layer::joined(below, above)))
            }
            TileImage::Switch(sw) => sw.select(dc).image.realize(dc),
            TileImage::Animation(anim) => anim.frame_at(dc.time).image().realize(dc),
        }
    }

    /// Whether this node selects between variants at draw time
    pub fn is_conditional(&self) -> bool {
        matches!(self, TileImage::Switch(_) | TileImage::Animation(_))
    }

    /// Whether a switch or animation appears anywhere in the tree
    pub fn contains_conditional(&self) -> bool {
        match self {
            TileImage::Source(_) | TileImage::Scaled(_) => false,
            TileImage::Sprite(sprite) => sprite.source.contains_conditional(),
            TileImage::Layer(layer) => {
                layer.below.contains_conditional() || layer.above.contains_conditional()
            }
            TileImage::Switch(_) | TileImage::Animation(_) => true,
        }
    }

    pub fn is_animated(&self) -> bool {
        match self {
            TileImage::Source(_) | TileImage::Scaled(_) => false,
            TileImage::Sprite(sprite) => sprite.source.is_animated(),
            TileImage::Layer(layer) => layer.below.is_animated() || layer.above.is_animated(),
            TileImage::Switch(sw) => sw
                .cases()
                .iter()
                .any(|c| c.condition.depends_on_time() || c.image.is_animated()),
            TileImage::Animation(_) => true,
        }
    }
}

impl fmt::Display for TileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileImage::Source(src) => {
                let (w, h) = src.pixels.dimensions();
                write!(f, "(source-image {}x{} {})", w, h, src.basis_size)
            }
            TileImage::Scaled(scaled) => {
                let (w, h) = scaled.source.pixels.dimensions();
                write!(
                    f,
                    "(scaled-source-image {}x{} {} -> {})",
                    w, h, scaled.source.basis_size, scaled.target_size
                )
            }
            TileImage::Sprite(sprite) => write!(
                f,
                "(simple {} offset {},{} overlap {},{})",
                sprite.source, sprite.offset_x, sprite.offset_y, sprite.overlap_east, sprite.overlap_north
            ),
            TileImage::Layer(layer) => write!(f, "(layered-image {} {})", layer.below, layer.above),
            TileImage::Switch(sw) => {
                write!(f, "(switch")?;
                for case in sw.cases() {
                    write!(f, " ({} {})", case.condition, case.image)?;
                }
                write!(f, ")")
            }
            TileImage::Animation(anim) => {
                write!(f, "(animation")?;
                for frame in anim.frames() {
                    write!(f, " ({} {})", frame.duration(), frame.image())?;
                }
                write!(f, ")")
            }
        }
    }
}
