//! Error types shared by the registry codec, geometry decoding and the resolver.

use thiserror::Error;

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Everything a region or parcel lookup can report back to its caller.
#[derive(Error, Debug)]
pub enum LocatorError {
    /// The registry answered with its `-1` "no result" signal
    #[error("registry returned no results")]
    NotFound,

    /// Response lines do not have the expected `|`-separated fields
    #[error("invalid registry response format: {0}")]
    InvalidFormat(String),

    /// Geometry field does not contain a `POLYGON((...))` body
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// First polygon vertex is not a pair of numbers
    #[error("invalid coordinate pair: {0:?}")]
    InvalidCoordinatePair(String),

    /// Neither a fully qualified identifier nor region + number were given
    #[error("not enough data to build a parcel query")]
    InsufficientQuery,

    /// A cached value could not be deserialized (evicted and refetched)
    #[error("corrupt cache entry under {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    /// Cache backend failure
    #[error("cache store error: {0}")]
    Store(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request never produced a response body
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Registry answered with a non-success HTTP status
    #[error("registry responded with HTTP {0}")]
    Status(u16),
}

impl LocatorError {
    /// True for errors caused by a response that could not be decoded
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            LocatorError::InvalidFormat(_)
                | LocatorError::InvalidGeometry(_)
                | LocatorError::InvalidCoordinatePair(_)
        )
    }
}
