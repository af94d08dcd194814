//! TTL caching layer.
//!
//! Provides a generic in-memory key/value store with per-entry expiry and
//! lazy eviction. There is no background sweep: an expired entry lives in
//! the map until the next read touches it.

mod ttl_cache;

pub use ttl_cache::{CacheStats, TtlCache};
