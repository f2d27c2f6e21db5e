//! City grid storage
//!
//! `CityMap` is the read-only view tile images and routing need; `TileGrid`
//! is the concrete grid that also carries per-cell traffic density.

use super::tiles::{is_routable, DIRT};
use super::types::CityLocation;

/// Traffic density never exceeds this value
pub const TRAFFIC_DENSITY_MAX: u8 = 240;

/// Read-only access to tile codes
pub trait CityMap {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Stored tile value, or `None` outside the map
    fn tile(&self, x: i32, y: i32) -> Option<u16>;

    fn is_routable_at(&self, loc: CityLocation) -> bool {
        self.tile(loc.x, loc.y).is_some_and(is_routable)
    }
}

/// A dense grid of tiles with a traffic density counter per cell
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<u16>,
    traffic: Vec<u8>,
}

impl TileGrid {
    /// Creates a grid of bare dirt
    pub fn new(width: u32, height: u32) -> Self {
        let cells = width as usize * height as usize;
        Self {
            width,
            height,
            tiles: vec![DIRT; cells],
            traffic: vec![0; cells],
        }
    }

    /// Flattened index of a cell, if it lies on the grid
    pub fn index(&self, loc: CityLocation) -> Option<usize> {
        if loc.x < 0 || loc.y < 0 || loc.x as u32 >= self.width || loc.y as u32 >= self.height {
            return None;
        }
        Some(loc.y as usize * self.width as usize + loc.x as usize)
    }

    pub fn location(&self, index: usize) -> CityLocation {
        let width = self.width as usize;
        CityLocation::new((index % width) as i32, (index / width) as i32)
    }

    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn contains(&self, loc: CityLocation) -> bool {
        self.index(loc).is_some()
    }

    /// Sets a tile; returns false when `loc` is off the grid
    pub fn set_tile(&mut self, loc: CityLocation, tile: u16) -> bool {
        match self.index(loc) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    pub fn traffic_density(&self, loc: CityLocation) -> Option<u8> {
        self.index(loc).map(|i| self.traffic[i])
    }

    /// Adds `delta` to the density at `loc`, clamped to
    /// `0..=TRAFFIC_DENSITY_MAX`. Returns the new density.
    pub fn add_traffic(&mut self, loc: CityLocation, delta: i32) -> Option<u8> {
        let i = self.index(loc)?;
        let density = i32::from(self.traffic[i])
            .saturating_add(delta)
            .clamp(0, i32::from(TRAFFIC_DENSITY_MAX));
        self.traffic[i] = density as u8;
        Some(self.traffic[i])
    }

    /// Lowers every density by `amount`, stopping at zero
    pub fn decay_traffic(&mut self, amount: u8) {
        for density in &mut self.traffic {
            *density = density.saturating_sub(amount);
        }
    }

    pub fn total_traffic(&self) -> u64 {
        self.traffic.iter().map(|&d| u64::from(d)).sum()
    }
}

impl CityMap for TileGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tile(&self, x: i32, y: i32) -> Option<u16> {
        self.index(CityLocation::new(x, y)).map(|i| self.tiles[i])
    }
}
