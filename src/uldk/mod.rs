//! ULDK cadastral registry: line-based text protocol and its HTTP transport.

mod client;
mod codec;

pub use client::{RegistryTransport, UldkClient, ULDK_ENDPOINT};
pub use codec::{
    decode_parcel, decode_regions, ParcelRecord, RegistryRequest, RequestKind,
};
