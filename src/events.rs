use std::sync::Arc;

use crate::Error;
use crate::Snapshot;

/// Signals delivered to namespace subscribers.
///
/// Per fetch, `Added` / `Changed` / `Deleted` events for individual keys are
/// always delivered before the terminal `Updated` event of that fetch.
#[derive(Debug, Clone)]
pub enum NamespaceEvent {
    /// Bootstrap finished, accessors are usable
    Ready,

    Added {
        key: String,
        value: String,
    },

    Changed {
        key: String,
        old_value: String,
        new_value: String,
    },

    Deleted {
        key: String,
        old_value: String,
    },

    /// Full before / after snapshots of a fetch that changed something
    Updated {
        old: Arc<Snapshot>,
        new: Arc<Snapshot>,
    },

    /// A fetch failed; the current snapshot is untouched
    FetchError(Arc<Error>),

    /// Persisting the snapshot failed; the in-memory snapshot stays committed
    SaveError(Arc<Error>),

    /// Snapshot persisted to the local cache
    Saved,
}

/// Signals emitted by a notification channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollingEvent {
    /// Something in the namespace with this identifier changed
    Update(String),

    /// The retry policy gave up; no further long-poll requests will be made
    Abandoned,
}
