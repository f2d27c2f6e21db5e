//! Grid routing and traffic accumulation
//!
//! Vehicles travel between structures over road and rail cells. A search
//! starts from the road cells bordering one structure, runs A* over
//! orthogonally adjacent routable cells with unit step cost, and raises the
//! traffic density of every cell along the route it finds.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use log::{debug, warn};

use super::city_map::{CityMap, TileGrid};
use super::tiles::footprint_size;
use super::types::{CityLocation, Footprint, Route, SpecifiedTile};

/// Cells a single search may expand before giving up
pub const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

/// Heuristic used by the route search: Manhattan distance plus one.
///
/// The constant shifts every estimate equally, so it never changes which
/// open cell is expanded next and routes stay shortest.
pub fn evalfunc(start: CityLocation, finish: CityLocation) -> u32 {
    start.manhattan(&finish).saturating_add(1)
}

/// Per-cell search record, indexed by flattened grid position
#[derive(Debug, Clone, Copy)]
struct Visit {
    cost: u32,
    parent: Option<usize>,
    closed: bool,
}

impl Default for Visit {
    fn default() -> Self {
        Self {
            cost: u32::MAX,
            parent: None,
            closed: false,
        }
    }
}

/// Routes traffic across a city grid
#[derive(Debug, Clone)]
pub struct TrafficSim {
    city: TileGrid,
    max_expansions: usize,
}

impl TrafficSim {
    pub fn new(city: TileGrid) -> Self {
        Self {
            city,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn city(&self) -> &TileGrid {
        &self.city
    }

    pub fn city_mut(&mut self) -> &mut TileGrid {
        &mut self.city
    }

    /// Finds the routable cells bordering the structure centred at `center`.
    ///
    /// The footprint is 4x4 for the large structures (airport, seaport,
    /// plants, stadium) and 3x3 otherwise.
    pub fn find_periphery_roads(&self, center: CityLocation) -> Vec<SpecifiedTile> {
        let size = self
            .city
            .tile(center.x, center.y)
            .map(footprint_size)
            .unwrap_or(3);
        self.discover_adjacent_roads(Footprint::around_center(center, size), center)
    }

    /// Registers every routable cell on the ring around `footprint`
    pub fn discover_adjacent_roads(&self, footprint: Footprint, origin: CityLocation) -> Vec<SpecifiedTile> {
        footprint
            .ring()
            .into_iter()
            .filter(|&loc| self.city.is_routable_at(loc))
            .map(|loc| SpecifiedTile::new(loc, origin, true))
            .collect()
    }

    /// Shortest route from `start` to `end` over routable cells.
    ///
    /// `start` itself need not be routable, but every later step must be.
    /// Returns `None` when no route exists or the search exceeds its
    /// expansion budget.
    pub fn find_way(&self, start: CityLocation, end: CityLocation) -> Option<Route> {
        if start == end {
            return Some(Route {
                cost: 0,
                path: vec![start],
            });
        }

        let start_idx = self.city.index(start)?;
        let end_idx = self.city.index(end)?;

        let mut visits = vec![Visit::default(); self.city.cell_count()];
        let mut open = BinaryHeap::new();
        visits[start_idx].cost = 0;
        open.push(Reverse((evalfunc(start, end), 0u32, start_idx)));

        let mut expansions = 0usize;
        while let Some(Reverse((_, cost, idx))) = open.pop() {
            if visits[idx].closed {
                continue;
            }
            visits[idx].closed = true;

            if idx == end_idx {
                let route = Route {
                    cost,
                    path: self.trace_back(&visits, end_idx),
                };
                debug!("route {} -> {} costs {}", start, end, cost);
                return Some(route);
            }

            expansions += 1;
            if expansions > self.max_expansions {
                warn!(
                    "route search {} -> {} gave up after {} expansions",
                    start, end, self.max_expansions
                );
                return None;
            }

            let here = self.city.location(idx);
            for next in here.neighbors() {
                let Some(next_idx) = self.city.index(next) else {
                    continue;
                };
                if visits[next_idx].closed || !self.city.is_routable_at(next) {
                    continue;
                }
                let next_cost = cost + 1;
                if next_cost < visits[next_idx].cost {
                    visits[next_idx].cost = next_cost;
                    visits[next_idx].parent = Some(idx);
                    let estimate = next_cost.saturating_add(evalfunc(next, end));
                    open.push(Reverse((estimate, next_cost, next_idx)));
                }
            }
        }

        None
    }

    fn trace_back(&self, visits: &[Visit], end_idx: usize) -> Vec<CityLocation> {
        let mut path = vec![self.city.location(end_idx)];
        let mut current = end_idx;
        while let Some(parent) = visits[current].parent {
            path.push(self.city.location(parent));
            current = parent;
        }
        path.reverse();
        path
    }

    /// Raises the traffic density at `pos` by `value`, saturating at the
    /// density limit. Returns the new density, or `None` off the grid.
    pub fn make_traffic(&mut self, pos: CityLocation, value: i32) -> Option<u8> {
        self.city.add_traffic(pos, value)
    }

    /// Follows the road leading away from `start` until it ends or branches
    pub fn find_end(&self, start: CityLocation) -> CityLocation {
        let mut seen = HashSet::from([start]);
        let mut current = start;
        loop {
            let onward: Vec<CityLocation> = current
                .neighbors()
                .into_iter()
                .filter(|n| !seen.contains(n) && self.city.is_routable_at(*n))
                .collect();
            let &[next] = onward.as_slice() else {
                return current;
            };
            seen.insert(next);
            current = next;
        }
    }

    /// Routes one trip between two structures and loads its cells with
    /// `delta` traffic. Picks the cheapest pair of entry points.
    pub fn generate_trip(
        &mut self,
        origin: CityLocation,
        destination: CityLocation,
        delta: i32,
    ) -> Option<Route> {
        let starts = self.find_periphery_roads(origin);
        let ends = self.find_periphery_roads(destination);

        let mut best: Option<Route> = None;
        for start in &starts {
            for end in &ends {
                if let Some(found) = &best {
                    if start.location.manhattan(&end.location) >= found.cost {
                        continue;
                    }
                }
                if let Some(route) = self.find_way(start.location, end.location) {
                    if best.as_ref().map_or(true, |b| route.cost < b.cost) {
                        best = Some(route);
                    }
                }
            }
        }

        let route = best?;
        for &cell in &route.path {
            self.make_traffic(cell, delta);
        }
        debug!(
            "trip {} -> {} over {} cells",
            origin,
            destination,
            route.path.len()
        );
        Some(route)
    }
}
