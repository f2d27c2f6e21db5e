//! Tile image compositing
//!
//! Tile images are small expression trees built once from markup and then
//! drawn many times. A renderer normalizes a tree once, realizes it against
//! each draw context, and draws the realized, condition-free tree.

mod condition;
mod loader;
mod normal_form;
mod realize_all;
mod sheet;
mod surface;
mod switch_image;
mod tile_image;
mod types;

pub use condition::{DrawContext, TileCondition, TileSide, TileSpec};
pub use loader::{
    load_tile_image, load_tile_set, LoadError, LoaderContext, TileImageReader, TileSet,
    DEFAULT_FRAME_DURATION,
};
pub use realize_all::{RealImage, RealImages};
pub use sheet::SheetContext;
pub use surface::Surface;
pub use switch_image::{Animation, Case, Frame, SwitchBuilder, SwitchImage};
pub use tile_image::{Layer, ScaledSourceImage, SourceImage, Sprite, TileImage, TileImageError};
pub use types::{to_pixels, FragmentRect, PixelRect, Size, STD_SIZE};
