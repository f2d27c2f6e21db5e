//! Core types for grid routing

use std::fmt;

/// A cell on the city grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CityLocation {
    pub x: i32,
    pub y: i32,
}

impl CityLocation {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Saturates at the `i32` bounds, which lie outside any grid
    pub fn offset(&self, dx: i32, dy: i32) -> CityLocation {
        CityLocation::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    pub fn manhattan(&self, other: &CityLocation) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// The four orthogonal neighbours: north, east, south, west
    pub fn neighbors(&self) -> [CityLocation; 4] {
        [
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
        ]
    }
}

impl fmt::Display for CityLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A discovered road cell and the structure it was discovered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecifiedTile {
    pub location: CityLocation,
    /// Back-pointer to the discovery origin
    pub origin: CityLocation,
    pub ready: bool,
}

impl SpecifiedTile {
    pub fn new(location: CityLocation, origin: CityLocation, ready: bool) -> Self {
        Self {
            location,
            origin,
            ready,
        }
    }
}

/// The square of cells covered by a multi-cell structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub left: i32,
    pub top: i32,
    pub size: u32,
}

impl Footprint {
    pub fn new(left: i32, top: i32, size: u32) -> Self {
        Self { left, top, size }
    }

    /// Structures are anchored at their centre tile, which sits one cell in
    /// from the top-left corner for both 3x3 and 4x4 footprints.
    pub fn around_center(center: CityLocation, size: u32) -> Self {
        Self::new(center.x - 1, center.y - 1, size)
    }

    pub fn contains(&self, loc: CityLocation) -> bool {
        let size = self.size as i32;
        loc.x >= self.left && loc.x < self.left + size && loc.y >= self.top && loc.y < self.top + size
    }

    /// Cells sharing an edge with the footprint, column by column from west
    /// to east. Diagonal corners are not included.
    pub fn ring(&self) -> Vec<CityLocation> {
        let size = self.size as i32;
        let (right, bottom) = (self.left + size, self.top + size);
        let mut cells = Vec::with_capacity(4 * self.size as usize);
        cells.extend((self.top..bottom).map(|y| CityLocation::new(self.left - 1, y)));
        for x in self.left..right {
            cells.push(CityLocation::new(x, self.top - 1));
            cells.push(CityLocation::new(x, bottom));
        }
        cells.extend((self.top..bottom).map(|y| CityLocation::new(right, y)));
        cells
    }
}

/// A route found by the pathfinder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Number of steps from start to end
    pub cost: u32,
    /// Every cell visited, start and end included
    pub path: Vec<CityLocation>,
}
