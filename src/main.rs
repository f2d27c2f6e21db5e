use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::{Rgba, RgbaImage};
use log::info;

use tilesim::engine::{SimCity, DEFAULT_MAX_EXPANSIONS, DEFAULT_TRIP_DELTA};
use tilesim::graphics::{SheetContext, TileImageReader, STD_SIZE};

#[derive(Parser)]
#[command(name = "tilesim")]
#[command(about = "City tile image inspection and headless traffic routing")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "200")]
    ticks: u32,

    /// Seed for a reproducible city layout and trip sequence
    #[arg(long)]
    seed: Option<u64>,

    /// City width in cells
    #[arg(long, default_value = "32")]
    width: u32,

    /// City height in cells
    #[arg(long, default_value = "24")]
    height: u32,

    /// Cells a single route search may expand before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_EXPANSIONS)]
    max_expansions: usize,

    /// Traffic added to each cell of a routed trip
    #[arg(long, default_value_t = DEFAULT_TRIP_DELTA)]
    trip_delta: i32,

    /// Print every tick's map instead of only the final one
    #[arg(long)]
    verbose: bool,

    /// Load a tile-set document and list the variants of each tile instead
    /// of running the simulation
    #[arg(long)]
    tiles: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match &cli.tiles {
        Some(path) => list_tile_variants(path),
        None => {
            run_headless(&cli);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Run the router over a generated city
fn run_headless(cli: &Cli) {
    println!("Running traffic routing in headless mode...");
    println!("Ticks: {}, Grid: {}x{}", cli.ticks, cli.width, cli.height);
    println!();

    let mut city = SimCity::create_test_city(cli.width, cli.height, cli.seed)
        .with_max_expansions(cli.max_expansions)
        .with_trip_delta(cli.trip_delta);

    println!("Initial state:");
    city.print_summary();
    city.draw_map();
    println!();

    for _ in 0..cli.ticks {
        city.tick();
        if cli.verbose {
            println!("--- After tick {} ---", city.time);
            city.draw_map();
        }
    }

    println!("=== Final State ===");
    city.print_summary();
    city.draw_map();
    city.log_statistics();
}

/// A checkerboard standing in for sheets that are not loaded from disk
fn placeholder_sheet() -> RgbaImage {
    let cells = 64;
    RgbaImage::from_fn(cells * STD_SIZE, cells * STD_SIZE, |x, y| {
        if (x / STD_SIZE + y / STD_SIZE) % 2 == 0 {
            Rgba([200, 200, 200, 255])
        } else {
            Rgba([60, 60, 60, 255])
        }
    })
}

fn list_tile_variants(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let mut ctx = SheetContext::new(STD_SIZE);
    ctx.set_fallback_sheet(placeholder_sheet());

    let tiles = TileImageReader::new(BufReader::new(file), &ctx)
        .read_tile_set()
        .with_context(|| format!("reading tile images from {}", path.display()))?;

    let mut total = 0;
    for (name, image) in tiles.iter() {
        let normal = image.normal_form();
        let variants: Vec<_> = normal.realize_all().collect();
        total += variants.len();
        println!(
            "{}: size {}, bounds {}, {} variant(s){}",
            name,
            normal.size(),
            normal.bounds(),
            variants.len(),
            if normal.is_animated() { ", animated" } else { "" }
        );
        for variant in &variants {
            println!("    when {}", variant.condition);
        }
    }

    info!("{} tiles, {} variants in total", tiles.len(), total);
    Ok(())
}
