use std::path::PathBuf;
use std::time::Duration;

pub const TEMP_PATH: &str = "./temp";

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Per-attempt ceiling, also sent to the server as `[timeout:...]`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Simplification tolerance in degrees
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// OSM admin_level of national borders
pub const DEFAULT_ADMIN_LEVEL: u8 = 2;

pub const DEFAULT_OUTPUT_NAME: &str = "roads";

pub fn get_temp_path() -> PathBuf {
    PathBuf::from(TEMP_PATH)
}
