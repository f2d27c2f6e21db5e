//! City grid and traffic routing
//!
//! This module holds the grid the tile images read from and the router
//! that moves traffic across it. It can run headless, without any
//! rendering.

mod city_map;
mod tiles;
mod traffic_sim;
mod types;
mod world;

pub use city_map::{CityMap, TileGrid, TRAFFIC_DENSITY_MAX};
pub use tiles::*;
pub use traffic_sim::{evalfunc, TrafficSim, DEFAULT_MAX_EXPANSIONS};
pub use types::{CityLocation, Footprint, Route, SpecifiedTile};
pub use world::{SimCity, BLOCK_SPACING, DEFAULT_TRIP_DELTA, TRAFFIC_DECAY};
