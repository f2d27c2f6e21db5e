//! Conditions that select between tile image variants
//!
//! A condition is evaluated against a draw context: the world state around
//! the tile being drawn and the current animation time.

use std::fmt;
use std::str::FromStr;

use crate::engine::{CityLocation, CityMap, TileClass, LOMASK};

/// Everything a tile image needs to know to pick its variant
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    /// Simulation tick counter, used for animation frame selection
    pub time: u64,
    /// Read-only view of the city grid
    pub city: &'a dyn CityMap,
    /// The grid cell being drawn
    pub location: CityLocation,
}

impl<'a> DrawContext<'a> {
    pub fn new(time: u64, city: &'a dyn CityMap, location: CityLocation) -> Self {
        Self {
            time,
            city,
            location,
        }
    }
}

/// Which cell a tile condition inspects, relative to the drawn cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSide {
    Here,
    West,
    East,
    North,
    South,
}

impl TileSide {
    /// Markup attribute carrying a condition on this side
    pub fn attribute(self) -> &'static str {
        match self {
            TileSide::Here => "tile",
            TileSide::West => "tile-west",
            TileSide::East => "tile-east",
            TileSide::North => "tile-north",
            TileSide::South => "tile-south",
        }
    }

    pub fn all() -> [TileSide; 5] {
        [
            TileSide::Here,
            TileSide::West,
            TileSide::East,
            TileSide::North,
            TileSide::South,
        ]
    }

    fn delta(self) -> (i32, i32) {
        match self {
            TileSide::Here => (0, 0),
            TileSide::West => (-1, 0),
            TileSide::East => (1, 0),
            TileSide::North => (0, -1),
            TileSide::South => (0, 1),
        }
    }
}

/// What a tile condition expects to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSpec {
    /// Any tile of the given class
    Class(TileClass),
    /// Exactly this tile code (ignoring status bits)
    Code(u16),
}

impl TileSpec {
    pub fn matches(self, tile: u16) -> bool {
        let code = tile & LOMASK;
        match self {
            TileSpec::Class(class) => TileClass::of(code) == class,
            TileSpec::Code(expected) => code == expected,
        }
    }
}

impl FromStr for TileSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u16>() {
            return Ok(TileSpec::Code(code));
        }
        TileClass::from_name(s)
            .map(TileSpec::Class)
            .ok_or_else(|| format!("unknown tile class '{}'", s))
    }
}

impl fmt::Display for TileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileSpec::Class(class) => write!(f, "{}", class.name()),
            TileSpec::Code(code) => write!(f, "{}", code),
        }
    }
}

/// A predicate over the draw context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileCondition {
    Always,
    Never,
    /// The tile on `side` of the drawn cell matches `spec`
    Tile { side: TileSide, spec: TileSpec },
    /// `time % period` lies in `start..end`
    Frame { period: u64, start: u64, end: u64 },
    And(Box<TileCondition>, Box<TileCondition>),
    Not(Box<TileCondition>),
}

impl TileCondition {
    pub fn tile(side: TileSide, spec: TileSpec) -> Self {
        TileCondition::Tile { side, spec }
    }

    /// Conjunction, folding away trivially true or false operands
    pub fn and(a: TileCondition, b: TileCondition) -> Self {
        match (a, b) {
            (TileCondition::Always, other) | (other, TileCondition::Always) => other,
            (TileCondition::Never, _) | (_, TileCondition::Never) => TileCondition::Never,
            (a, b) => TileCondition::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn negate(c: TileCondition) -> Self {
        match c {
            TileCondition::Always => TileCondition::Never,
            TileCondition::Never => TileCondition::Always,
            TileCondition::Not(inner) => *inner,
            other => TileCondition::Not(Box::new(other)),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, TileCondition::Always)
    }

    /// Whether the outcome can change with the animation clock
    pub fn depends_on_time(&self) -> bool {
        match self {
            TileCondition::Frame { .. } => true,
            TileCondition::And(a, b) => a.depends_on_time() || b.depends_on_time(),
            TileCondition::Not(a) => a.depends_on_time(),
            TileCondition::Always | TileCondition::Never | TileCondition::Tile { .. } => false,
        }
    }

    pub fn matches(&self, dc: &DrawContext<'_>) -> bool {
        match self {
            TileCondition::Always => true,
            TileCondition::Never => false,
            TileCondition::Tile { side, spec } => {
                let (dx, dy) = side.delta();
                let loc = dc.location.offset(dx, dy);
                dc.city
                    .tile(loc.x, loc.y)
                    .map(|tile| spec.matches(tile))
                    .unwrap_or(false)
            }
            TileCondition::Frame { period, start, end } => {
                let t = dc.time % (*period).max(1);
                *start <= t && t < *end
            }
            TileCondition::And(a, b) => a.matches(dc) && b.matches(dc),
            TileCondition::Not(a) => !a.matches(dc),
        }
    }
}

impl fmt::Display for TileCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileCondition::Always => write!(f, "always"),
            TileCondition::Never => write!(f, "never"),
            TileCondition::Tile { side, spec } => write!(f, "{}={}", side.attribute(), spec),
            TileCondition::Frame { period, start, end } => {
                write!(f, "frame {}..{}/{}", start, end, period)
            }
            TileCondition::And(a, b) => write!(f, "(and {} {})", a, b),
            TileCondition::Not(a) => write!(f, "(not {})", a),
        }
    }
}
