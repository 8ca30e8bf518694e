//! Overpass elements to GeoJSON features.
//!
//! Nodes become points, ways become line strings and relations become
//! geometry collections of their way members. Conversion never fails on a
//! single element: whatever cannot be turned into a feature is listed in the
//! [`ConversionReport`] with the reason it was left out.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::collect::overpass::elements::{ElementRecord, LatLon, RawElement, RawMember, RawResponse};

/// Which elements count as features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Keep only elements carrying this tag key (e.g. `highway`); `None`
    /// keeps everything
    pub required_tag: Option<String>,
}

impl ConvertOptions {
    pub fn with_required_tag(tag: &str) -> Self {
        ConvertOptions {
            required_tag: Some(tag.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Node without coordinates or way without embedded geometry
    MissingGeometry,
    /// Not a well-formed node, way or relation
    UnrecognizedType,
    /// Relation without a members list
    EmptyMembers,
    /// Lacks the tag required by [`ConvertOptions::required_tag`]
    FilteredByTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedElement {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    pub reason: SkipReason,
}

/// What the converter left out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub skipped: Vec<SkippedElement>,
    /// Relation members dropped for not being ways with geometry
    pub dropped_members: usize,
}

impl ConversionReport {
    pub fn count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    pub fn is_lossless(&self) -> bool {
        self.skipped.is_empty() && self.dropped_members == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub collection: FeatureCollection,
    pub report: ConversionReport,
}

/// Convert with default options (no tag filter)
pub fn convert(response: RawResponse) -> Conversion {
    convert_with(response, &ConvertOptions::default())
}

pub fn convert_with(response: RawResponse, options: &ConvertOptions) -> Conversion {
    let mut features = Vec::with_capacity(response.elements.len());
    let mut report = ConversionReport::default();

    for record in response.elements {
        let element = match record {
            ElementRecord::Known(element) => element,
            unrecognized => {
                report.skipped.push(SkippedElement {
                    id: unrecognized.id(),
                    element_type: unrecognized.element_type(),
                    reason: SkipReason::UnrecognizedType,
                });
                continue;
            }
        };

        if let Some(tag) = &options.required_tag {
            if !element.has_tag(tag) {
                report.skipped.push(skipped(&element, SkipReason::FilteredByTag));
                continue;
            }
        }

        match element_to_feature(&element, &mut report.dropped_members) {
            Ok(feature) => features.push(feature),
            Err(reason) => report.skipped.push(skipped(&element, reason)),
        }
    }

    info!(
        "Converted {} features ({} elements skipped, {} relation members dropped)",
        features.len(),
        report.skipped.len(),
        report.dropped_members
    );

    Conversion {
        collection: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        report,
    }
}

fn skipped(element: &RawElement, reason: SkipReason) -> SkippedElement {
    SkippedElement {
        id: Some(element.id()),
        element_type: Some(element.kind().to_string()),
        reason,
    }
}

fn element_to_feature(element: &RawElement, dropped_members: &mut usize) -> Result<Feature, SkipReason> {
    let value = match element {
        RawElement::Node { lat, lon, .. } => match (lat, lon) {
            (Some(lat), Some(lon)) => Value::Point(vec![*lon, *lat]),
            _ => return Err(SkipReason::MissingGeometry),
        },
        RawElement::Way { geometry, .. } => {
            let geometry = geometry.as_ref().ok_or(SkipReason::MissingGeometry)?;
            Value::LineString(line_coordinates(geometry))
        }
        RawElement::Relation { id, members, .. } => {
            let members = members.as_ref().ok_or(SkipReason::EmptyMembers)?;
            let lines: Vec<Geometry> = members
                .iter()
                .filter_map(|member| {
                    let line = member_line(member);
                    if line.is_none() {
                        *dropped_members += 1;
                        if member.kind == "relation" {
                            debug!("Relation {id}: nested relation {:?} not resolved", member.id);
                        }
                    }
                    line
                })
                .collect();
            Value::GeometryCollection(lines)
        }
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(element.tags().cloned().unwrap_or_default()),
        foreign_members: None,
    })
}

/// Way member with embedded geometry as a LineString
fn member_line(member: &RawMember) -> Option<Geometry> {
    if member.kind != "way" {
        return None;
    }
    let geometry = member.geometry.as_ref()?;
    Some(Geometry::new(Value::LineString(line_coordinates(geometry))))
}

fn line_coordinates(points: &[Option<LatLon>]) -> Vec<Vec<f64>> {
    points.iter().flatten().map(LatLon::position).collect()
}
