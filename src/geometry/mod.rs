//! Parcel geometry: WKT vertex extraction and PUWG 1992 → WGS84 conversion.

mod projection;
mod wkt;

pub use projection::{TransverseMercator, GRS80_A, GRS80_F};
pub use wkt::first_vertex;
