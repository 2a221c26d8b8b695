//! Client-side synchronization engine for Apollo-style configuration services.
//!
//! ```text
//! Application ── Cluster ── Namespace (snapshot, cache, periodic fetch)
//!                   │
//!                   └── Polling (one long-poll channel per host/app/cluster)
//! ```
//!
//! The long poll tells a namespace *when* it changed, a fetch tells it *what*
//! changed. Changes are delivered as [`NamespaceEvent`]s over broadcast
//! channels; the local cache keeps the last snapshot for offline bootstrap.

mod application;
mod cluster;
mod config;
pub mod constants;
mod diff;
mod errors;
mod events;
mod namespace;
mod polling;
mod registry;
mod storage;
mod transport;
pub(crate) mod utils;

pub use application::*;
pub use cluster::*;
pub use config::*;
pub use diff::*;
pub use errors::*;
pub use events::*;
pub use namespace::*;
pub use polling::*;
pub use registry::*;
pub use storage::*;
pub use transport::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
