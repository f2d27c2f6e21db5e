//! Tile codes and their classification
//!
//! Codes follow the classic city tile sheet layout: each class occupies a
//! contiguous range. The upper bits of a stored tile carry status flags
//! and are masked off with `LOMASK` before classifying.

/// Mask selecting the tile code from a stored tile value
pub const LOMASK: u16 = 0x03ff;

pub const DIRT: u16 = 0;
pub const RIVER: u16 = 2;
pub const LASTRIVEDGE: u16 = 20;
pub const TREEBASE: u16 = 21;
pub const WOODS5: u16 = 43;
pub const RUBBLE: u16 = 44;
pub const LASTRUBBLE: u16 = 47;
pub const FLOOD: u16 = 48;
pub const LASTFLOOD: u16 = 51;
pub const RADTILE: u16 = 52;
pub const FIRE: u16 = 56;
pub const LASTFIRE: u16 = 63;

pub const ROADBASE: u16 = 64;
pub const HBRIDGE: u16 = 64;
pub const VBRIDGE: u16 = 65;
pub const ROADS: u16 = 66;
pub const ROADS2: u16 = 67;
pub const INTERSECTION: u16 = 76;
pub const HROADPOWER: u16 = 77;
pub const VROADPOWER: u16 = 78;
pub const LASTROAD: u16 = 206;

pub const POWERBASE: u16 = 208;
pub const HPOWER: u16 = 208;
pub const VPOWER: u16 = 209;
pub const RAILHPOWERV: u16 = 221;
pub const RAILVPOWERH: u16 = 222;
pub const LASTPOWER: u16 = 222;

pub const RAILBASE: u16 = 224;
pub const HRAIL: u16 = 226;
pub const VRAIL: u16 = 227;
pub const HRAILROAD: u16 = 237;
pub const VRAILROAD: u16 = 238;
pub const LASTRAIL: u16 = 238;

pub const RESBASE: u16 = 240;
pub const FREEZ: u16 = 244;
pub const COMBASE: u16 = 423;
pub const COMCLR: u16 = 427;
pub const INDBASE: u16 = 612;
pub const INDCLR: u16 = 616;
pub const PORTBASE: u16 = 693;
pub const PORT: u16 = 698;
pub const AIRPORT: u16 = 716;
pub const POWERPLANT: u16 = 750;
pub const STADIUM: u16 = 784;
pub const FULLSTADIUM: u16 = 800;
pub const NUCLEAR: u16 = 816;

/// Broad tile classes, as used by image conditions and routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClass {
    Dirt,
    Water,
    Trees,
    Rubble,
    Flood,
    Radioactive,
    Fire,
    Road,
    Power,
    Rail,
    Residential,
    Commercial,
    Industrial,
    Special,
}

impl TileClass {
    /// Classifies a stored tile value
    pub fn of(tile: u16) -> TileClass {
        match tile & LOMASK {
            DIRT..=1 => TileClass::Dirt,
            RIVER..=LASTRIVEDGE => TileClass::Water,
            TREEBASE..=WOODS5 => TileClass::Trees,
            RUBBLE..=LASTRUBBLE => TileClass::Rubble,
            FLOOD..=LASTFLOOD => TileClass::Flood,
            RADTILE..=55 => TileClass::Radioactive,
            FIRE..=LASTFIRE => TileClass::Fire,
            ROADBASE..=LASTROAD => TileClass::Road,
            // rail crossing a power line sits in the power range
            RAILHPOWERV | RAILVPOWERH => TileClass::Rail,
            POWERBASE..=LASTPOWER => TileClass::Power,
            RAILBASE..=LASTRAIL => TileClass::Rail,
            RESBASE..=422 => TileClass::Residential,
            COMBASE..=611 => TileClass::Commercial,
            INDBASE..=692 => TileClass::Industrial,
            _ => TileClass::Special,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TileClass::Dirt => "dirt",
            TileClass::Water => "water",
            TileClass::Trees => "trees",
            TileClass::Rubble => "rubble",
            TileClass::Flood => "flood",
            TileClass::Radioactive => "radioactive",
            TileClass::Fire => "fire",
            TileClass::Road => "road",
            TileClass::Power => "power",
            TileClass::Rail => "rail",
            TileClass::Residential => "residential",
            TileClass::Commercial => "commercial",
            TileClass::Industrial => "industrial",
            TileClass::Special => "special",
        }
    }

    pub fn from_name(name: &str) -> Option<TileClass> {
        let class = match name {
            "dirt" => TileClass::Dirt,
            "water" => TileClass::Water,
            "trees" => TileClass::Trees,
            "rubble" => TileClass::Rubble,
            "flood" => TileClass::Flood,
            "radioactive" => TileClass::Radioactive,
            "fire" => TileClass::Fire,
            "road" => TileClass::Road,
            "power" => TileClass::Power,
            "rail" => TileClass::Rail,
            "residential" => TileClass::Residential,
            "commercial" => TileClass::Commercial,
            "industrial" => TileClass::Industrial,
            "special" => TileClass::Special,
            _ => return None,
        };
        Some(class)
    }
}

/// Whether vehicles can travel over this tile: every road and rail variant,
/// including bridges and power-line crossings.
pub fn is_routable(tile: u16) -> bool {
    matches!(TileClass::of(tile), TileClass::Road | TileClass::Rail)
}

/// Side length, in cells, of the structure whose centre tile is `tile`
pub fn footprint_size(tile: u16) -> u32 {
    match tile & LOMASK {
        AIRPORT | PORT | POWERPLANT | STADIUM | FULLSTADIUM | NUCLEAR => 4,
        _ => 3,
    }
}
