//! On-disk snapshot cache.
//!
//! One JSON file per namespace identity, used to bootstrap when the config
//! service is unreachable.

mod local_cache;
pub use local_cache::*;

#[cfg(test)]
mod local_cache_test;
