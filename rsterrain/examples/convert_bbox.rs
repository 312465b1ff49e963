use anyhow::Result;
use rsterrain::{ConverterConfig, OutputFormat, Terrain, TerrainOutcome};

/// Example: San Francisco peninsula from tiles stored in ./earthdata
fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("=== Example: SRTM tiles to elevation points ===\n");

    let mut terrain = Terrain::new(ConverterConfig {
        format: OutputFormat::Geojson,
        ..ConverterConfig::default()
    });
    terrain.set_bbox(-122.52, 37.70, -122.35, 37.83);
    terrain.set_step(2);

    println!("Bounding box set:");
    println!("  - Longitude: -122.52 to -122.35");
    println!("  - Latitude: 37.70 to 37.83");
    println!("  - Tiles read from {:?}\n", terrain.config().earthdata_dir);

    match terrain.run()? {
        TerrainOutcome::Written { path, point_count } => {
            println!("\nWrote {} points to {:?}", point_count, path);
        }
        TerrainOutcome::NoTiles => println!("\nNo tile archive covers this area"),
        TerrainOutcome::NoValidPoints => println!("\nOnly voids inside this area"),
    }

    Ok(())
}
