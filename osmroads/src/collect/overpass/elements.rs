use serde::Deserialize;
use serde_json::{Map, Value};

/// OSM tags, kept as raw JSON so they reach the output untouched
pub type Tags = Map<String, Value>;

/// Overpass JSON response (`[out:json]`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawResponse {
    pub elements: Vec<ElementRecord>,
    /// Runtime diagnostic from the server, e.g. a query timeout that
    /// truncated the result
    #[serde(default)]
    pub remark: Option<String>,
}

impl RawResponse {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// One entry of the `elements` array
///
/// Anything that is not a well-formed node, way or relation is kept as raw
/// JSON so the converter can report it instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ElementRecord {
    Known(RawElement),
    Unrecognized(Value),
}

impl ElementRecord {
    /// Best-effort `id` of the record, readable even when unrecognized
    pub fn id(&self) -> Option<i64> {
        match self {
            ElementRecord::Known(element) => Some(element.id()),
            ElementRecord::Unrecognized(value) => value.get("id").and_then(Value::as_i64),
        }
    }

    /// Best-effort `type` of the record, readable even when unrecognized
    pub fn element_type(&self) -> Option<String> {
        match self {
            ElementRecord::Known(element) => Some(element.kind().to_string()),
            ElementRecord::Unrecognized(value) => value
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node {
        id: i64,
        lat: Option<f64>,
        lon: Option<f64>,
        tags: Option<Tags>,
    },
    Way {
        id: i64,
        /// Present with `out geom`; null entries are unresolved nodes
        geometry: Option<Vec<Option<LatLon>>>,
        tags: Option<Tags>,
    },
    Relation {
        id: i64,
        members: Option<Vec<RawMember>>,
        tags: Option<Tags>,
    },
}

impl RawElement {
    pub fn id(&self) -> i64 {
        match self {
            RawElement::Node { id, .. } | RawElement::Way { id, .. } | RawElement::Relation { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RawElement::Node { .. } => "node",
            RawElement::Way { .. } => "way",
            RawElement::Relation { .. } => "relation",
        }
    }

    pub fn tags(&self) -> Option<&Tags> {
        match self {
            RawElement::Node { tags, .. }
            | RawElement::Way { tags, .. }
            | RawElement::Relation { tags, .. } => tags.as_ref(),
        }
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags().is_some_and(|tags| tags.contains_key(key))
    }
}

/// Relation member reference
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMember {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "ref", default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub role: String,
    /// Only way members carry a geometry list
    pub geometry: Option<Vec<Option<LatLon>>>,
}

/// Coordinate pair as emitted by `out geom`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// GeoJSON position, longitude first
    pub fn position(&self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}
