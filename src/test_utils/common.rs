use std::time::Duration;

use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::ClientOptions;
use crate::ClientOptionsBuilder;
use crate::Snapshot;

pub(crate) const TEST_HOST: &str = "http://localhost:8080";
pub(crate) const TEST_APP_ID: &str = "SampleApp";

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    once_cell::sync::Lazy::force(&LOGGER_INIT);
}

pub fn snapshot(pairs: &[(&str, &str)]) -> Snapshot {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub(crate) fn options_builder() -> ClientOptionsBuilder {
    ClientOptions::builder(TEST_HOST, TEST_APP_ID)
}

pub(crate) fn options() -> ClientOptions {
    options_builder().build().unwrap()
}

/// Body of the uncached config endpoint
pub(crate) fn config_body(
    pairs: &[(&str, &str)],
    release_key: &str,
) -> String {
    serde_json::json!({
        "appId": TEST_APP_ID,
        "cluster": "default",
        "configurations": snapshot(pairs),
        "releaseKey": release_key,
    })
    .to_string()
}

/// Body of the cache-friendly config endpoint
pub(crate) fn flat_body(pairs: &[(&str, &str)]) -> String {
    serde_json::to_string(&snapshot(pairs)).unwrap()
}

/// Body of a 200 long-poll response
pub(crate) fn notifications_body(entries: &[(&str, i64)]) -> String {
    let list: Vec<_> = entries
        .iter()
        .map(|(ns, id)| serde_json::json!({ "namespaceName": ns, "notificationId": id }))
        .collect();
    serde_json::Value::Array(list).to_string()
}

/// Receives the next event, panicking if none arrives within `wait`
pub(crate) async fn next_event<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    wait: Duration,
) -> T {
    tokio::time::timeout(wait, rx.recv())
        .await
        .expect("no event received in time")
        .expect("event channel closed")
}

/// Drains whatever is buffered right now
pub(crate) fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}
