use std::time::Duration;

// -
// Defaults

pub const DEFAULT_CLUSTER: &str = "default";
pub const DEFAULT_NAMESPACE: &str = "application";

/// Periodic re-fetch interval
pub const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Unit of the linear polling retry delay
pub const DEFAULT_RETRY_UNIT_DELAY: Duration = Duration::from_secs(10);

/// Attempt count from which the default retry policy restarts its sequence
pub(crate) const RETRY_RESET_THRESHOLD: u32 = 6;

/// The config service holds a long-poll request for at most this long
pub const LONG_POLL_SERVER_WAIT: Duration = Duration::from_secs(60);

/// Must stay above LONG_POLL_SERVER_WAIT
pub const DEFAULT_POLLING_TIMEOUT: Duration = Duration::from_secs(65);

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// -
// Wire

pub(crate) const HTTP_OK: u16 = 200;
pub(crate) const HTTP_NOT_MODIFIED: u16 = 304;

/// Separator for composite registry / cache keys
pub(crate) const KEY_SEPARATOR: &str = "|";

/// Prefix for environment overrides, e.g. `APOLLO__APP_ID`
pub(crate) const ENV_PREFIX: &str = "APOLLO";
