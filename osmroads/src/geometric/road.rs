use anyhow::{Context, Result};
use geojson::FeatureCollection;
use log::info;
use std::path::{Path, PathBuf};

use crate::collect::global_variables::{get_temp_path, DEFAULT_OUTPUT_NAME};
use crate::collect::overpass::OverpassCollect;
use crate::commons::basic_functions::write_geojson;
use crate::geo_core::{BoundingBox, RegionFilter};
use crate::geometric::convert::{convert_with, ConversionReport, ConvertOptions};
use crate::geometric::simplify::{simplify, validate_tolerance};

/// Road network structure
/// Provides methods to download OSM elements for a region from Overpass,
/// convert them to GeoJSON, simplify and save them
pub struct RoadNetwork {
    /// OverpassCollect instance for API requests
    overpass_collect: OverpassCollect,
    /// Output path for processed data
    output_path: PathBuf,
    /// Region to download
    region: Option<RegionFilter>,
    /// Element filtering policy
    pub convert_options: ConvertOptions,
    /// Converted features
    geojson: Option<FeatureCollection>,
    /// Elements left out by the last conversion
    report: Option<ConversionReport>,
}

impl RoadNetwork {
    /// Create a new RoadNetwork using the default Overpass endpoint
    #[cfg(feature = "http")]
    pub fn new(output_path: Option<String>) -> Result<Self> {
        let collect = OverpassCollect::new().context("Failed to create HTTP client")?;
        Ok(Self::with_collector(collect, output_path))
    }

    pub fn with_collector(overpass_collect: OverpassCollect, output_path: Option<String>) -> Self {
        let output_path_buf = output_path.map(PathBuf::from).unwrap_or_else(get_temp_path);

        RoadNetwork {
            overpass_collect,
            output_path: output_path_buf,
            region: None,
            convert_options: ConvertOptions::default(),
            geojson: None,
            report: None,
        }
    }

    /// Set bounding box (south, west, north, east)
    pub fn set_bbox(&mut self, south: f64, west: f64, north: f64, east: f64) -> Result<()> {
        let bbox = BoundingBox::new(south, west, north, east).context("Invalid bounding box")?;
        self.region = Some(bbox.into());
        Ok(())
    }

    /// Set a country by name
    pub fn set_area(&mut self, name: &str) -> Result<()> {
        self.region = Some(RegionFilter::country(name).context("Invalid area name")?);
        Ok(())
    }

    pub fn set_region(&mut self, region: RegionFilter) {
        self.region = Some(region);
    }

    /// Keep only elements carrying `tag` (e.g. `highway`), or everything
    pub fn set_required_tag(&mut self, tag: Option<&str>) {
        self.convert_options.required_tag = tag.map(str::to_string);
    }

    /// Run processing: download from Overpass, convert to GeoJSON
    pub fn run(mut self) -> Result<Self> {
        self.run_internal()?;
        Ok(self)
    }

    /// Internal run method that can be called mutably
    pub fn run_internal(&mut self) -> Result<()> {
        let region = self
            .region
            .as_ref()
            .context("Region must be set before running")?;

        info!("Downloading OSM data for {region}");
        let response = self
            .overpass_collect
            .fetch_tagged(region, self.convert_options.required_tag.as_deref())
            .context(format!("Failed to download OSM data for {region}"))?;

        let conversion = convert_with(response, &self.convert_options);
        self.geojson = Some(conversion.collection);
        self.report = Some(conversion.report);

        Ok(())
    }

    /// Simplify the converted lines in place
    pub fn simplify(&mut self, tolerance: f64) -> Result<()> {
        validate_tolerance(tolerance).context("Failed to simplify GeoJSON")?;
        let geojson = self
            .geojson
            .take()
            .context("No GeoJSON data available. Call run() first.")?;
        self.geojson = Some(simplify(geojson, tolerance)?);
        Ok(())
    }

    pub fn get_geojson(&self) -> Option<&FeatureCollection> {
        self.geojson.as_ref()
    }

    pub fn get_report(&self) -> Option<&ConversionReport> {
        self.report.as_ref()
    }

    /// Save to `<output_path>/<name>.geojson` and return the written path
    pub fn to_geojson(&self, name: Option<&str>) -> Result<PathBuf> {
        let geojson = self
            .geojson
            .as_ref()
            .context("No GeoJSON data available. Call run() first.")?;

        let name = name.unwrap_or(DEFAULT_OUTPUT_NAME);
        let output_file = self.output_path.join(format!("{}.geojson", name));
        write_geojson(&output_file, geojson)?;

        info!(
            "{} features saved to: {:?}",
            geojson.features.len(),
            output_file
        );
        Ok(output_file)
    }

    /// Get output path
    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::overpass::overpass_collect::test_support::*;
    use crate::collect::overpass::{FetchConfig, TransportError};
    use crate::geometric::convert::SkipReason;
    use geojson::Value;

    const IRAN_SAMPLE: &[u8] = br#"{
        "version": 0.6,
        "elements": [
            {"type": "node", "id": 1, "lat": 35.70, "lon": 51.40, "tags": {"highway": "traffic_signals"}},
            {"type": "node", "id": 2, "lat": 35.71, "lon": 51.41},
            {"type": "way", "id": 10, "nodes": [1, 2, 3],
             "geometry": [{"lat": 35.70, "lon": 51.40}, {"lat": 35.705, "lon": 51.4050001}, {"lat": 35.71, "lon": 51.41}],
             "tags": {"highway": "primary", "name": "Enghelab"}},
            {"type": "way", "id": 11, "nodes": [2, 4]},
            {"type": "relation", "id": 100, "tags": {"type": "route", "route": "road"},
             "members": [{"type": "way", "ref": 10, "role": "",
                          "geometry": [{"lat": 35.70, "lon": 51.40}, {"lat": 35.71, "lon": 51.41}]}]}
        ]
    }"#;

    type Outcome = std::result::Result<Vec<u8>, TransportError>;

    fn build_network(
        outcomes: Vec<Outcome>,
        output: &Path,
    ) -> (RoadNetwork, ScriptedTransport, RecordingSleeper) {
        let transport = ScriptedTransport::new(outcomes);
        let sleeper = RecordingSleeper::default();
        let collect =
            OverpassCollect::with_transport(FetchConfig::default(), transport.clone(), sleeper.clone());
        let output_path = Some(output.to_string_lossy().to_string());
        (RoadNetwork::with_collector(collect, output_path), transport, sleeper)
    }

    #[test]
    fn test_run_requires_region() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, transport, _) = build_network(vec![], dir.path());
        assert!(network.run_internal().is_err());
        assert_eq!(transport.attempts(), 0);
    }

    #[test]
    fn test_run_convert_simplify_save() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, transport, sleeper) =
            build_network(vec![gateway_timeout(), Ok(IRAN_SAMPLE.to_vec())], dir.path());
        network.set_area("Iran").unwrap();

        let mut network = network.run().unwrap();

        assert_eq!(transport.attempts(), 2);
        assert_eq!(sleeper.delays.borrow().len(), 1);
        assert!(transport.queries.borrow()[0].contains(r#"area["name"="Iran"]["admin_level"="2"]"#));

        let geojson = network.get_geojson().unwrap();
        assert_eq!(geojson.features.len(), 4);
        let report = network.get_report().unwrap();
        assert_eq!(report.count(SkipReason::MissingGeometry), 1);
        assert_eq!(report.skipped[0].id, Some(11));

        network.simplify(0.001).unwrap();
        let way = &network.get_geojson().unwrap().features[2];
        let Value::LineString(line) = &way.geometry.as_ref().unwrap().value else {
            panic!("expected the way as a line string");
        };
        assert_eq!(line.len(), 2);

        let path = network.to_geojson(Some("iran_roads")).unwrap();
        assert_eq!(path, dir.path().join("iran_roads.geojson"));
        let text = std::fs::read_to_string(&path).unwrap();
        let saved: FeatureCollection = serde_json::from_str(&text).unwrap();
        assert_eq!(&saved, network.get_geojson().unwrap());
    }

    #[test]
    fn test_highway_filter() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, _, _) = build_network(vec![Ok(IRAN_SAMPLE.to_vec())], dir.path());
        network.set_bbox(35.0, 51.0, 36.0, 52.0).unwrap();
        network.set_required_tag(Some("highway"));

        network.run_internal().unwrap();

        assert_eq!(network.get_geojson().unwrap().features.len(), 2);
        assert_eq!(network.get_report().unwrap().count(SkipReason::FilteredByTag), 3);
    }

    #[test]
    fn test_required_tag_is_sent_to_server() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, transport, _) = build_network(vec![Ok(IRAN_SAMPLE.to_vec())], dir.path());
        network.set_area("Iran").unwrap();
        network.set_required_tag(Some("highway"));

        network.run_internal().unwrap();

        let queries = transport.queries.borrow();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains(r#"node(area.searchArea)["highway"];"#));
        assert!(queries[0].contains(r#"way(area.searchArea)["highway"];"#));
        assert!(queries[0].contains(r#"relation(area.searchArea)["highway"];"#));
    }

    #[test]
    fn test_failed_fetch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, transport, _) =
            build_network(vec![gateway_timeout(), gateway_timeout(), gateway_timeout()], dir.path());
        network.set_bbox(35.0, 51.0, 36.0, 52.0).unwrap();

        assert!(network.run_internal().is_err());
        assert_eq!(transport.attempts(), 3);
        assert!(network.to_geojson(None).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_tolerance_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, _, _) = build_network(vec![Ok(IRAN_SAMPLE.to_vec())], dir.path());
        network.set_bbox(35.0, 51.0, 36.0, 52.0).unwrap();
        network.run_internal().unwrap();

        assert!(network.simplify(-1.0).is_err());
        assert_eq!(network.get_geojson().unwrap().features.len(), 4);
    }

    #[test]
    fn test_invalid_region_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let (mut network, _, _) = build_network(vec![], dir.path());
        assert!(network.set_bbox(50.0, 0.0, 10.0, 1.0).is_err());
        assert!(network.set_area("").is_err());
    }

    #[test]
    fn test_default_output_path() {
        let collect = OverpassCollect::with_transport(
            FetchConfig::default(),
            ScriptedTransport::default(),
            RecordingSleeper::default(),
        );
        let network = RoadNetwork::with_collector(collect, None);
        assert_eq!(network.get_output_path(), Path::new("./temp"));
    }
}
