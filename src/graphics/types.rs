//! Geometry primitives for tile images
//!
//! Sizes and bounds are reported in output pixels. Fragment rectangles,
//! sprite offsets and overlaps are expressed in standard units, where one
//! grid cell is `STD_SIZE` units wide.

use std::fmt;

/// Number of standard units per grid cell
pub const STD_SIZE: u32 = 16;

/// A width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A square size, the usual shape of a tile cell
    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Element-wise maximum of two sizes
    pub fn max(self, other: Size) -> Size {
        Size {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rectangle in standard units, relative to a node's own origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FragmentRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The standard cell at the origin
    pub fn cell() -> Self {
        Self::new(0, 0, STD_SIZE, STD_SIZE)
    }

    /// Converts this rectangle from standard units into a space with
    /// `pixels_per_cell` pixels per grid cell.
    pub fn scaled(&self, pixels_per_cell: u32) -> PixelRect {
        let scale = |v: i64| v * i64::from(pixels_per_cell) / i64::from(STD_SIZE);
        PixelRect {
            x: scale(i64::from(self.x)),
            y: scale(i64::from(self.y)),
            width: scale(i64::from(self.width)) as u32,
            height: scale(i64::from(self.height)) as u32,
        }
    }
}

/// A rectangle in pixels of some concrete image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Converts a length in standard units into pixels at the given cell size
pub fn to_pixels(units: u32, pixels_per_cell: u32) -> u32 {
    units * pixels_per_cell / STD_SIZE
}
