use std::sync::LazyLock;

use geo::Coord;
use regex::Regex;

use crate::error::{LocatorError, Result};

static POLYGON_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"POLYGON\(\((.+)\)\)").expect("static pattern"));

/// First vertex of a `SRID=2180;POLYGON((x y,x y,...))` geometry field.
///
/// Returned as planar `Coord { x: easting, y: northing }`.
pub fn first_vertex(geometry: &str) -> Result<Coord<f64>> {
    let body = POLYGON_BODY
        .captures(geometry)
        .and_then(|c| c.get(1))
        .ok_or_else(|| LocatorError::InvalidGeometry(geometry.chars().take(64).collect()))?
        .as_str();

    let vertex = body.split(',').next().unwrap_or("").trim();
    let parts: Vec<&str> = vertex.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(LocatorError::InvalidCoordinatePair(vertex.to_string()));
    }

    match (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
        (Ok(x), Ok(y)) => Ok(Coord { x, y }),
        _ => Err(LocatorError::InvalidCoordinatePair(vertex.to_string())),
    }
}
