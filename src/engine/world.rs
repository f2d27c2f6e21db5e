//! Headless city that drives the router
//!
//! Lays out a block grid of roads with zones in between, then routes a
//! trip between two random zones every tick. Used by the binary and by
//! tests that want a populated grid.

use log::info;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::city_map::{CityMap, TileGrid};
use super::tiles::{
    TileClass, AIRPORT, COMCLR, FREEZ, HRAIL, INDCLR, INTERSECTION, ROADS, ROADS2,
};
use super::traffic_sim::TrafficSim;
use super::types::{CityLocation, Footprint};

/// Spacing between parallel roads in the generated city
pub const BLOCK_SPACING: i32 = 4;

/// Traffic added to every cell of a routed trip
pub const DEFAULT_TRIP_DELTA: i32 = 50;

/// Density shed by every cell each tick
pub const TRAFFIC_DECAY: u8 = 1;

/// Chance that a road segment is missing in the generated city
const MISSING_ROAD_CHANCE: f64 = 0.08;

/// The headless simulation world
pub struct SimCity {
    pub traffic: TrafficSim,

    /// Centre tiles of every placed structure
    pub zones: Vec<CityLocation>,

    pub time: u64,
    pub trips_routed: usize,
    pub trips_failed: usize,

    trip_delta: i32,

    /// Optional seeded RNG for reproducible runs
    rng: Option<StdRng>,
}

impl SimCity {
    fn new_internal(grid: TileGrid, rng: Option<StdRng>) -> Self {
        Self {
            traffic: TrafficSim::new(grid),
            zones: Vec::new(),
            time: 0,
            trips_routed: 0,
            trips_failed: 0,
            trip_delta: DEFAULT_TRIP_DELTA,
            rng,
        }
    }

    pub fn new(grid: TileGrid) -> Self {
        Self::new_internal(grid, None)
    }

    /// Create a city with a seeded RNG for reproducible runs
    pub fn new_with_seed(grid: TileGrid, seed: u64) -> Self {
        Self::new_internal(grid, Some(StdRng::seed_from_u64(seed)))
    }

    pub fn with_trip_delta(mut self, delta: i32) -> Self {
        self.trip_delta = delta;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.traffic = self.traffic.with_max_expansions(max_expansions);
        self
    }

    fn random_index(&mut self, len: usize) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        }
    }

    fn random_chance(&mut self, p: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(p),
            None => rand::rng().random_bool(p),
        }
    }

    /// Builds a block-grid city: roads every `BLOCK_SPACING` cells, a rail
    /// line through the middle, a zone in each block and an airport in the
    /// south-east corner when there is room.
    pub fn create_test_city(width: u32, height: u32, seed: Option<u64>) -> Self {
        let grid = TileGrid::new(width, height);
        let mut city = match seed {
            Some(seed) => Self::new_with_seed(grid, seed),
            None => Self::new(grid),
        };
        city.lay_roads();
        city.place_zones();
        city
    }

    fn lay_roads(&mut self) {
        let (width, height) = (self.city().width() as i32, self.city().height() as i32);
        let rail_row = (height / 2 / BLOCK_SPACING) * BLOCK_SPACING;

        for y in 0..height {
            for x in 0..width {
                let on_column = x % BLOCK_SPACING == 0;
                let on_row = y % BLOCK_SPACING == 0;
                let tile = match (on_column, on_row) {
                    (true, true) => INTERSECTION,
                    (false, true) if y == rail_row => HRAIL,
                    (false, true) => ROADS,
                    (true, false) => ROADS2,
                    (false, false) => continue,
                };
                if tile != INTERSECTION && self.random_chance(MISSING_ROAD_CHANCE) {
                    continue;
                }
                self.traffic.city_mut().set_tile(CityLocation::new(x, y), tile);
            }
        }
    }

    fn place_zones(&mut self) {
        let (width, height) = (self.city().width() as i32, self.city().height() as i32);
        let zone_tiles = [FREEZ, COMCLR, INDCLR];

        for top in (1..height - 3).step_by(BLOCK_SPACING as usize) {
            for left in (1..width - 3).step_by(BLOCK_SPACING as usize) {
                let center = CityLocation::new(left + 1, top + 1);
                let tile = zone_tiles[self.random_index(zone_tiles.len())];
                self.fill_footprint(Footprint::around_center(center, 3), tile);
                self.zones.push(center);
            }
        }

        // a 4x4 airport needs a block of its own; take the last one if the
        // grid is large enough and widen it over the road it replaces
        if let Some(&center) = self.zones.last() {
            let footprint = Footprint::around_center(center, 4);
            if footprint.left + 4 < width && footprint.top + 4 < height {
                self.fill_footprint(footprint, AIRPORT);
            }
        }
    }

    fn fill_footprint(&mut self, footprint: Footprint, center_tile: u16) {
        let size = footprint.size as i32;
        let center = CityLocation::new(footprint.left + 1, footprint.top + 1);
        for y in footprint.top..footprint.top + size {
            for x in footprint.left..footprint.left + size {
                let loc = CityLocation::new(x, y);
                let tile = if loc == center { center_tile } else { center_tile - 1 };
                self.traffic.city_mut().set_tile(loc, tile);
            }
        }
    }

    pub fn city(&self) -> &TileGrid {
        self.traffic.city()
    }

    /// Advances one tick: traffic decays, then one trip is routed between
    /// two distinct random zones.
    pub fn tick(&mut self) {
        self.time += 1;
        self.traffic.city_mut().decay_traffic(TRAFFIC_DECAY);

        if self.zones.len() < 2 {
            return;
        }
        let from = self.random_index(self.zones.len());
        let mut to = self.random_index(self.zones.len() - 1);
        if to >= from {
            to += 1;
        }
        let (origin, destination) = (self.zones[from], self.zones[to]);

        match self.traffic.generate_trip(origin, destination, self.trip_delta) {
            Some(_) => self.trips_routed += 1,
            None => self.trips_failed += 1,
        }
    }

    /// Print a summary of the city state
    pub fn print_summary(&self) {
        println!("=== City Traffic Summary ===");
        println!("Tick: {}", self.time);
        println!(
            "Grid: {}x{}, Zones: {}",
            self.city().width(),
            self.city().height(),
            self.zones.len()
        );
        println!(
            "Trips routed: {}, failed: {}",
            self.trips_routed, self.trips_failed
        );
        println!("Total traffic density: {}", self.city().total_traffic());
    }

    /// Log the final statistics through the logger
    pub fn log_statistics(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Ticks: {}", self.time);
        info!("Zones: {}", self.zones.len());
        info!("Trips routed: {}", self.trips_routed);
        info!("Trips failed: {}", self.trips_failed);
        info!("Total traffic density: {}", self.city().total_traffic());
    }

    /// Draw an ASCII map: zones as letters, roads and rail shaded by density
    pub fn draw_map(&self) {
        let city = self.city();
        for y in 0..city.height() as i32 {
            let row: String = (0..city.width() as i32)
                .map(|x| {
                    let loc = CityLocation::new(x, y);
                    let tile = city.tile(x, y).unwrap_or_default();
                    let density = city.traffic_density(loc).unwrap_or(0);
                    match TileClass::of(tile) {
                        TileClass::Rail if density == 0 => '-',
                        TileClass::Road | TileClass::Rail => match density {
                            0 => '.',
                            1..=60 => ':',
                            61..=150 => '+',
                            _ => '#',
                        },
                        TileClass::Residential => 'R',
                        TileClass::Commercial => 'C',
                        TileClass::Industrial => 'I',
                        TileClass::Special => 'A',
                        _ => ' ',
                    }
                })
                .collect();
            println!("{}", row);
        }
    }
}
