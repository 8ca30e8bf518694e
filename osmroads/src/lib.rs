//! Download OpenStreetMap data for a country or bounding box from the
//! Overpass API, convert it to GeoJSON and simplify it for web maps.
//!
//! ```no_run
//! use osmroads::geometric::road::RoadNetwork;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut roads = RoadNetwork::new(Some("./output".to_string()))?;
//! roads.set_area("Iran")?;
//! roads.set_required_tag(Some("highway"));
//! let mut roads = roads.run()?;
//! roads.to_geojson(Some("iran_highways"))?;
//! roads.simplify(0.001)?;
//! roads.to_geojson(Some("iran_simplified"))?;
//! # Ok(())
//! # }
//! ```

pub mod collect;
pub mod commons;
pub mod geo_core;
pub mod geometric;

pub use geometric::convert::{convert, convert_with, Conversion, ConversionReport, ConvertOptions};
pub use geometric::simplify::simplify;
