use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collect::global_variables::DEFAULT_ADMIN_LEVEL;

/// Errors raised while building a region filter
#[derive(Debug, Error, PartialEq)]
pub enum RegionError {
    #[error("bounding box needs 4 comma-separated numbers (south,west,north,east), got {0}")]
    Arity(usize),
    #[error("bounding box value {value:?} is not a number")]
    NotANumber { value: String },
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("south edge {south} lies north of north edge {north}")]
    Inverted { south: f64, north: f64 },
    #[error("area name must not be empty")]
    EmptyName,
}

/// Bounding box structure, in WGS84 degrees
///
/// Field order follows the Overpass convention (south, west, north, east),
/// which is also the order accepted by [`BoundingBox::from_str`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64, // min latitude
    pub west: f64,  // min longitude
    pub north: f64, // max latitude
    pub east: f64,  // max longitude
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, RegionError> {
        for lat in [south, north] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(RegionError::Latitude(lat));
            }
        }
        for lon in [west, east] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(RegionError::Longitude(lon));
            }
        }
        if south > north {
            return Err(RegionError::Inverted { south, north });
        }
        Ok(BoundingBox {
            south,
            west,
            north,
            east,
        })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl FromStr for BoundingBox {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(RegionError::Arity(parts.len()));
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| RegionError::NotANumber {
                value: (*part).to_string(),
            })?;
        }
        let [south, west, north, east] = values;
        BoundingBox::new(south, west, north, east)
    }
}

/// Server-side area selector scoping a fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionFilter {
    /// Administrative area resolved by name on the server
    NamedArea { name: String, admin_level: u8 },
    BoundingBox(BoundingBox),
}

impl RegionFilter {
    /// Country-level named area (admin level 2)
    pub fn country(name: &str) -> Result<Self, RegionError> {
        Self::named_area(name, DEFAULT_ADMIN_LEVEL)
    }

    pub fn named_area(name: &str, admin_level: u8) -> Result<Self, RegionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegionError::EmptyName);
        }
        Ok(RegionFilter::NamedArea {
            name: name.to_string(),
            admin_level,
        })
    }
}

impl From<BoundingBox> for RegionFilter {
    fn from(bbox: BoundingBox) -> Self {
        RegionFilter::BoundingBox(bbox)
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionFilter::NamedArea { name, admin_level } => {
                write!(f, "area {name:?} (admin_level {admin_level})")
            }
            RegionFilter::BoundingBox(bbox) => write!(f, "bbox {bbox}"),
        }
    }
}
