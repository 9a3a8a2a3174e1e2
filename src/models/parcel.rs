//! Per-query records: cadastral regions, parcel queries and resolved parcels.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LocatorError, Result};

static FULLY_QUALIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+_[0-9].*$").expect("static pattern"));

/// Cadastral region (obręb) inside a municipality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// Registry code, e.g. `146501.0001`
    pub code: String,
}

impl Region {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

impl super::Named for Region {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

/// Geographic point (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

/// Identifier sent to the registry's parcel lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelQuery {
    pub identifier: String,
}

impl ParcelQuery {
    /// Build a query from user input.
    ///
    /// A fully qualified identifier (`146501_1.0001.12`) is used as-is;
    /// anything else needs a region code and becomes `{region}.{number}`.
    pub fn from_input(number: &str, region_code: Option<&str>) -> Result<Self> {
        let number = number.trim();
        if number.is_empty() {
            return Err(LocatorError::InsufficientQuery);
        }

        if is_fully_qualified(number) {
            return Ok(Self {
                identifier: number.to_string(),
            });
        }

        match region_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(region) => Ok(Self {
                identifier: format!("{}.{}", region, number),
            }),
            None => Err(LocatorError::InsufficientQuery),
        }
    }
}

/// Digits, underscore, digit, then anything
pub fn is_fully_qualified(value: &str) -> bool {
    FULLY_QUALIFIED.is_match(value)
}

/// A located parcel with its derived links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: String,
    pub parcel_number: String,
    /// First vertex of the parcel outline
    pub position: GeoPoint,
    pub map_link: String,
    pub registry_link: String,
}
