//! Region lookup cache and its pluggable stores.

mod lookup;
mod store;

pub use lookup::{cache_key, LookupCache};
pub use store::{CacheStore, MemoryStore, SledStore};
