use anyhow::Result;
use osmroads::collect::overpass::{FetchConfig, OverpassCollect};
use osmroads::geometric::road::RoadNetwork;
use std::time::Duration;

/// Example: Loading every node, way and relation inside a bounding box
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Example: Loading OSM data for a bounding box ===\n");

    // Shorter retry policy than the default 3 x 30 s
    let config = FetchConfig {
        max_attempts: 2,
        retry_delay: Duration::from_secs(10),
        timeout: Duration::from_secs(120),
        ..FetchConfig::default()
    };
    let collect = OverpassCollect::with_config(config)?;
    let mut roads = RoadNetwork::with_collector(collect, Some("./output".to_string()));

    // Central Tehran (south, west, north, east)
    roads.set_bbox(35.68, 51.38, 35.72, 51.43)?;

    println!("  - Bounding box: 35.68,51.38,35.72,51.43");
    println!("  - No tag filter: points, lines and relations are all kept\n");

    let roads = roads.run()?;

    if let Some(geojson) = roads.get_geojson() {
        println!("  - Number of features: {}", geojson.features.len());
    }

    let path = roads.to_geojson(Some("tehran"))?;
    println!("\nProcessing complete: {:?}", path);

    Ok(())
}
