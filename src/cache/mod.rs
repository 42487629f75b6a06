//! Response caching
//!
//! Persists model answers on disk so repeated questions skip generation.

pub mod response_cache;

pub use response_cache::{CacheEntry, CacheStats, ResponseCache, DEFAULT_MAX_AGE};
