use anyhow::Result;
use osmroads::collect::global_variables::DEFAULT_TOLERANCE;
use osmroads::geometric::road::RoadNetwork;

/// Example: Loading the highway network of a country from Overpass
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Example: Loading Iran highways from Overpass ===\n");

    let mut roads = RoadNetwork::new(Some("./output".to_string()))?;

    // Whole country, resolved server-side (admin_level 2)
    roads.set_area("Iran")?;
    // Only elements tagged highway=*
    roads.set_required_tag(Some("highway"));

    println!("Downloading and converting OSM data (this can take several minutes)...");
    let mut roads = roads.run()?;

    if let Some(geojson) = roads.get_geojson() {
        println!("  - Number of features: {}", geojson.features.len());
    }
    if let Some(report) = roads.get_report() {
        println!("  - Skipped elements: {}", report.skipped.len());
        println!("  - Dropped relation members: {}", report.dropped_members);
    }

    let full = roads.to_geojson(Some("iran_highways"))?;
    println!("\nFull GeoJSON: {:?}", full);

    roads.simplify(DEFAULT_TOLERANCE)?;
    let simplified = roads.to_geojson(Some("iran_simplified"))?;
    println!("Simplified GeoJSON: {:?}", simplified);

    Ok(())
}
