//! ULDK request encoding and response decoding.
//!
//! Responses are plain text. A body starting with `-1` means "no result".
//! Otherwise the first line may be a status marker (`0` for region lookups,
//! `1` for parcel lookups) followed by `|`-separated records:
//!
//! ```text
//! 1
//! 146501_1.0001.12|12|SRID=2180;POLYGON((741707.5 382851.1,...))
//! ```
//!
//! Only the first line is ever treated as a marker, so a genuine record that
//! equals the marker in that position is consumed as one.

use tracing::debug;

use crate::error::{LocatorError, Result};
use crate::models::{ParcelQuery, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    GetRegionById,
    GetParcelByIdOrNr,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::GetRegionById => "GetRegionById",
            RequestKind::GetParcelByIdOrNr => "GetParcelByIdOrNr",
        }
    }

    /// Field selector sent as the `result` parameter
    pub fn result_fields(&self) -> &'static str {
        match self {
            RequestKind::GetRegionById => "teryt,region",
            RequestKind::GetParcelByIdOrNr => "teryt,parcel,geom_wkt",
        }
    }

    /// Status line the registry puts before the records
    pub fn status_marker(&self) -> &'static str {
        match self {
            RequestKind::GetRegionById => "0",
            RequestKind::GetParcelByIdOrNr => "1",
        }
    }
}

/// A single registry request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    pub kind: RequestKind,
    pub id: String,
}

impl RegistryRequest {
    /// Region lookup for a municipality identifier (`146501_1`)
    pub fn regions(municipality_id: &str) -> Self {
        Self {
            kind: RequestKind::GetRegionById,
            id: municipality_id.to_string(),
        }
    }

    pub fn parcel(query: &ParcelQuery) -> Self {
        Self {
            kind: RequestKind::GetParcelByIdOrNr,
            id: query.identifier.clone(),
        }
    }

    /// Query string parameters, in the order the registry documents them
    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("request", self.kind.as_str()),
            ("id", self.id.as_str()),
            ("result", self.kind.result_fields()),
        ]
    }
}

/// Undecoded parcel record: `id|number|geometry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelRecord {
    pub id: String,
    pub parcel_number: String,
    pub geometry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    AwaitingStatusLine,
    Data,
}

/// Split a response into its non-blank data lines, dropping the status line
fn data_lines(response: &str, kind: RequestKind) -> Result<Vec<&str>> {
    let trimmed = response.trim();
    if trimmed.starts_with("-1") {
        return Err(LocatorError::NotFound);
    }

    let mut state = DecodeState::AwaitingStatusLine;
    let mut lines = Vec::new();

    for line in trimmed.split('\n').map(str::trim) {
        if state == DecodeState::AwaitingStatusLine {
            state = DecodeState::Data;
            if line == kind.status_marker() {
                continue;
            }
            debug!("{} response has no status line", kind.as_str());
        }

        if !line.is_empty() {
            lines.push(line);
        }
    }

    Ok(lines)
}

/// Decode a `GetRegionById` response into regions, in response order
pub fn decode_regions(response: &str) -> Result<Vec<Region>> {
    data_lines(response, RequestKind::GetRegionById)?
        .into_iter()
        .map(|line| {
            let mut fields = line.split('|');
            match (fields.next(), fields.next()) {
                (Some(code), Some(name)) => Ok(Region::new(name, code)),
                _ => Err(LocatorError::InvalidFormat(format!(
                    "expected code|name, got {:?}",
                    line
                ))),
            }
        })
        .collect()
}

/// Decode a `GetParcelByIdOrNr` response into its first record
pub fn decode_parcel(response: &str) -> Result<ParcelRecord> {
    let lines = data_lines(response, RequestKind::GetParcelByIdOrNr)?;
    let line = lines.first().ok_or(LocatorError::NotFound)?;

    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 3 {
        return Err(LocatorError::InvalidFormat(format!(
            "expected id|number|geometry, got {:?}",
            line
        )));
    }

    Ok(ParcelRecord {
        id: fields[0].to_string(),
        parcel_number: fields[1].to_string(),
        geometry: fields[2].to_string(),
    })
}
