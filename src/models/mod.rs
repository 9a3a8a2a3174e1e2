//! Core data models for parcel lookup.

pub mod admin;
pub mod parcel;

pub use admin::{
    sorted_by_name, AdminHierarchy, AdminLevel, County, Municipality, Named, Voivodeship,
};
pub use parcel::{GeoPoint, Parcel, ParcelQuery, Region};
