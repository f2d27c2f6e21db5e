use std::fs;
use std::process::Command;

/// Runs the built binary with the given arguments and info-level logging
fn run_tilesim(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tilesim"))
        .args(args)
        .env("RUST_LOG", "warn,tilesim=info")
        .output()
        .expect("Failed to execute tilesim")
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_tilesim(&["--ticks", "20", "--seed", "7"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that simulation statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_tilesim(&["--ticks", "30", "--seed", "11", "--width", "24", "--height", "16"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for stat in ["Ticks:", "Zones:", "Trips routed:", "Trips failed:", "Total traffic density:"] {
        assert!(stderr.contains(stat), "Missing '{}' statistic", stat);
    }

    // Format: "[2026-01-01T00:00:00Z INFO  tilesim::engine::world] Ticks: 30"
    let ticks_line = stderr
        .lines()
        .find(|line| line.contains("Ticks:"))
        .expect("Could not find 'Ticks' line");
    let ticks: u64 = ticks_line
        .split("Ticks:")
        .nth(1)
        .and_then(|s| s.trim().parse().ok())
        .expect("Could not parse tick count");
    assert_eq!(ticks, 30);
}

/// Test that the final map is printed to stdout
#[test]
fn test_simulation_prints_map() {
    let output = run_tilesim(&["--ticks", "5", "--seed", "3", "--width", "16", "--height", "12"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Final State ==="));
    assert!(
        stdout
            .lines()
            .any(|line| line.len() == 16 && line.chars().any(|c| matches!(c, 'R' | 'C' | 'I'))),
        "No zones drawn on the map. stdout: {}",
        stdout
    );
}

/// Test that a tile-set document can be listed
#[test]
fn test_tile_listing() {
    let path = std::env::temp_dir().join(format!("tilesim-tiles-{}.xml", std::process::id()));
    fs::write(
        &path,
        r#"<micropolis-tiles>
             <tile name="road">
               <switch>
                 <case tile-west="road"><image src="roads" at="16,0"/></case>
                 <default><image src="roads" at="0,0"/></default>
               </switch>
             </tile>
             <tile name="fire">
               <animation>
                 <frame>fire@0,0</frame>
                 <frame>fire@16,0</frame>
               </animation>
             </tile>
           </micropolis-tiles>"#,
    )
    .expect("Failed to write tile document");

    let path_arg = path.to_string_lossy().into_owned();
    let output = run_tilesim(&["--tiles", &path_arg]);
    let _ = fs::remove_file(&path);

    assert!(
        output.status.success(),
        "Tile listing failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("road: size 16x16, bounds 16x16, 2 variant(s)"), "stdout: {}", stdout);
    assert!(stdout.contains("fire: size 16x16, bounds 16x16, 2 variant(s), animated"), "stdout: {}", stdout);
    assert!(stdout.contains("when tile-west=road"), "stdout: {}", stdout);
}

/// Test that a malformed tile-set document is reported as an error
#[test]
fn test_tile_listing_rejects_bad_document() {
    let path = std::env::temp_dir().join(format!("tilesim-bad-{}.xml", std::process::id()));
    fs::write(&path, r#"<tiles><tile name="x"><image at="3"/></tile></tiles>"#)
        .expect("Failed to write tile document");

    let path_arg = path.to_string_lossy().into_owned();
    let output = run_tilesim(&["--tiles", &path_arg]);
    let _ = fs::remove_file(&path);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid 'at' syntax"), "stderr: {}", stderr);
}
