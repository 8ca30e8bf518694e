//! Command-line entry point: download, convert, optionally simplify, save.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use log::{error, info, warn};

use osmroads::collect::global_variables::{
    DEFAULT_ADMIN_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_NAME, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT, OVERPASS_URL, TEMP_PATH,
};
use osmroads::collect::overpass::{FetchConfig, OverpassCollect};
use osmroads::commons::basic_functions::write_json;
use osmroads::geo_core::{BoundingBox, RegionFilter};
use osmroads::geometric::road::RoadNetwork;
use osmroads::geometric::simplify::validate_tolerance;

#[derive(Debug, Parser)]
#[command(
    name = "osmroads",
    about = "Download OpenStreetMap data from Overpass and save it as GeoJSON",
    version
)]
#[command(group(ArgGroup::new("region").required(true).args(["area", "bbox"])))]
struct Cli {
    /// Administrative area name, e.g. "Iran"
    #[arg(long)]
    area: Option<String>,
    /// OSM admin_level of the named area
    #[arg(long, default_value_t = DEFAULT_ADMIN_LEVEL)]
    admin_level: u8,
    /// Bounding box as south,west,north,east
    #[arg(long, value_name = "S,W,N,E", allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,
    /// Overpass interpreter URL
    #[arg(long, env = "OSMROADS_ENDPOINT", default_value = OVERPASS_URL)]
    endpoint: String,
    /// Total download attempts
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
    /// Seconds to wait between attempts
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    retry_delay: u64,
    /// Per-attempt timeout in seconds
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
    /// Keep only elements carrying this tag key, e.g. "highway"
    #[arg(long, value_name = "KEY")]
    require_tag: Option<String>,
    /// Also write a simplified copy, tolerance in degrees (e.g. 0.001)
    #[arg(long, value_name = "DEG", value_parser = parse_tolerance)]
    tolerance: Option<f64>,
    /// Output directory
    #[arg(long, default_value = TEMP_PATH)]
    output_dir: PathBuf,
    /// Base name of the output files
    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    name: String,
    /// Write the list of skipped elements as JSON
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn parse_tolerance(value: &str) -> Result<f64, String> {
    let tolerance: f64 = value.parse().map_err(|e| format!("{e}"))?;
    validate_tolerance(tolerance).map_err(|e| e.to_string())?;
    Ok(tolerance)
}

impl Cli {
    fn region(&self) -> Result<RegionFilter> {
        match (&self.area, self.bbox) {
            (_, Some(bbox)) => Ok(bbox.into()),
            (Some(name), None) => Ok(RegionFilter::named_area(name, self.admin_level)?),
            (None, None) => anyhow::bail!("either --area or --bbox is required"),
        }
    }

    fn fetch_config(&self) -> Result<FetchConfig> {
        let config = FetchConfig::with_endpoint(&self.endpoint)
            .context(format!("Invalid endpoint URL: {}", self.endpoint))?;
        Ok(FetchConfig {
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay),
            timeout: Duration::from_secs(self.timeout),
            ..config
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let region = cli.region()?;
    let collect = OverpassCollect::with_config(cli.fetch_config()?)
        .context("Failed to create HTTP client")?;

    let output_dir = cli.output_dir.to_string_lossy().to_string();
    let mut roads = RoadNetwork::with_collector(collect, Some(output_dir));
    roads.set_region(region);
    roads.set_required_tag(cli.require_tag.as_deref());

    let mut roads = roads.run()?;

    if let Some(report) = roads.get_report() {
        if !report.is_lossless() {
            warn!(
                "{} elements skipped, {} relation members dropped",
                report.skipped.len(),
                report.dropped_members
            );
        }
        if let Some(path) = &cli.report {
            write_json(path, report)?;
            info!("Report saved to: {:?}", path);
        }
    }

    roads.to_geojson(Some(&cli.name))?;

    if let Some(tolerance) = cli.tolerance {
        roads.simplify(tolerance)?;
        roads.to_geojson(Some(&format!("{}_simplified", cli.name)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bbox_args() {
        let cli = Cli::try_parse_from([
            "osmroads",
            "--bbox",
            "24.396308,44.031311,39.771722,63.333557",
            "--tolerance",
            "0.001",
        ])
        .unwrap();
        assert!(matches!(cli.region().unwrap(), RegionFilter::BoundingBox(_)));
        assert_eq!(cli.tolerance, Some(0.001));

        let config = cli.fetch_config().unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_negative_bbox_values() {
        let cli = Cli::try_parse_from(["osmroads", "--bbox", "-34.1,-58.6,-34.5,-58.3"]);
        // south above north is rejected at parse time
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["osmroads", "--bbox", "-34.7,-58.6,-34.5,-58.3"]).unwrap();
        assert_eq!(cli.bbox.unwrap().south, -34.7);
    }

    #[test]
    fn test_area_args() {
        let cli = Cli::try_parse_from(["osmroads", "--area", "Iran", "--require-tag", "highway"]).unwrap();
        assert_eq!(
            cli.region().unwrap(),
            RegionFilter::NamedArea {
                name: "Iran".to_string(),
                admin_level: 2
            }
        );
        assert_eq!(cli.require_tag.as_deref(), Some("highway"));
    }

    #[test]
    fn test_region_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["osmroads"]).is_err());
        assert!(Cli::try_parse_from(["osmroads", "--area", "Iran", "--bbox", "1,2,3,4"]).is_err());
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        assert!(Cli::try_parse_from(["osmroads", "--area", "Iran", "--tolerance", "-1"]).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["osmroads", "--area", "Iran", "--timeout", "0"]).is_err());
        let cli = Cli::try_parse_from(["osmroads", "--area", "Iran", "--timeout", "1"]).unwrap();
        assert_eq!(cli.fetch_config().unwrap().timeout, Duration::from_secs(1));
    }
}
