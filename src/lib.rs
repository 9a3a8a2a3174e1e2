//! Dzialka - locate Polish cadastral parcels through the ULDK registry
//!
//! This library provides shared types and modules for the locate and serve binaries.

pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod resolver;
pub mod teryt;
pub mod uldk;

pub use error::{LocatorError, Result};
pub use models::{AdminHierarchy, Parcel, ParcelQuery, Region};
pub use resolver::ParcelResolver;
