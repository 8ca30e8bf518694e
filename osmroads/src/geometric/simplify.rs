use geo::{Coord, LineString, Simplify};
use geojson::{Feature, FeatureCollection, Geometry, LineStringType, Value};
use log::info;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SimplifyError {
    #[error("tolerance must be a finite, non-negative number, got {0}")]
    InvalidTolerance(f64),
}

/// Ramer–Douglas–Peucker simplification of every line in the collection
///
/// `tolerance` is in coordinate units (degrees for lon/lat data). Points and
/// polygons pass through unchanged, geometry collections are simplified
/// member by member, and properties are untouched. A line is never reduced
/// below its two endpoints.
pub fn simplify(collection: FeatureCollection, tolerance: f64) -> Result<FeatureCollection, SimplifyError> {
    validate_tolerance(tolerance)?;

    let before = vertex_count(&collection);
    let features: Vec<Feature> = collection
        .features
        .into_iter()
        .map(|mut feature| {
            feature.geometry = feature
                .geometry
                .map(|geometry| simplify_geometry(geometry, tolerance));
            feature
        })
        .collect();
    let simplified = FeatureCollection { features, ..collection };

    info!(
        "Simplified with tolerance {tolerance}: {before} -> {} vertices",
        vertex_count(&simplified)
    );
    Ok(simplified)
}

/// Tolerance must be finite and non-negative
pub fn validate_tolerance(tolerance: f64) -> Result<(), SimplifyError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(SimplifyError::InvalidTolerance(tolerance));
    }
    Ok(())
}

fn simplify_geometry(geometry: Geometry, tolerance: f64) -> Geometry {
    let value = match geometry.value {
        Value::LineString(line) => Value::LineString(simplify_line(line, tolerance)),
        Value::MultiLineString(lines) => Value::MultiLineString(
            lines
                .into_iter()
                .map(|line| simplify_line(line, tolerance))
                .collect(),
        ),
        Value::GeometryCollection(geometries) => Value::GeometryCollection(
            geometries
                .into_iter()
                .map(|child| simplify_geometry(child, tolerance))
                .collect(),
        ),
        other => other,
    };
    Geometry { value, ..geometry }
}

fn simplify_line(line: LineStringType, tolerance: f64) -> LineStringType {
    if line.len() <= 2 {
        return line;
    }
    let Some(coords) = line
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<Coord<f64>>>>()
    else {
        return line;
    };

    let simplified = LineString::new(coords).simplify(&tolerance);
    if simplified.0.len() < 2 {
        return endpoints(line);
    }
    simplified.0.into_iter().map(|c| vec![c.x, c.y]).collect()
}

fn endpoints(line: LineStringType) -> LineStringType {
    match (line.first(), line.last()) {
        (Some(first), Some(last)) => vec![first.clone(), last.clone()],
        _ => line,
    }
}

/// Total number of positions in every line-shaped geometry
pub fn vertex_count(collection: &FeatureCollection) -> usize {
    fn count(value: &Value) -> usize {
        match value {
            Value::Point(_) => 1,
            Value::LineString(line) | Value::MultiPoint(line) => line.len(),
            Value::MultiLineString(lines) | Value::Polygon(lines) => lines.iter().map(Vec::len).sum(),
            Value::MultiPolygon(polygons) => polygons.iter().flatten().map(Vec::len).sum(),
            Value::GeometryCollection(geometries) => geometries.iter().map(|g| count(&g.value)).sum(),
        }
    }
    collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(|g| count(&g.value))
        .sum()
}
