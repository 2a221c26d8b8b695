//! Long-poll notification channel.
//!
//! One [`Polling`] per (host, app_id, cluster) tells every namespace of that
//! cluster *when* it changed. [`PollingRegistry`] deduplicates the channels so
//! clusters with the same identity share one connection.

mod long_poll;
mod polling_registry;
pub use long_poll::*;
pub use polling_registry::*;


use serde::Deserialize;
use serde::Serialize;

/// Wire entry of the `/notifications/v2` request and response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Notification {
    pub(crate) namespace_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) notification_id: Option<i64>,
}
