use std::sync::Arc;

use super::Polling;
use crate::registry::Registry;
use crate::utils::key::create_key;
use crate::ClientOptions;
use crate::HttpTransport;
use crate::Result;

/// Shared notification channels, keyed by (host, app_id, cluster).
///
/// Applications built with the same registry share channels. Settings such
/// as the retry policy come from whichever caller created the channel first.
#[derive(Default)]
pub struct PollingRegistry {
    channels: Registry<Polling>,
}

impl PollingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &self,
        options: &ClientOptions,
        cluster: &str,
        transport: &Arc<dyn HttpTransport>,
    ) -> Result<Arc<Polling>> {
        let key = polling_key(options.host(), options.app_id(), cluster);
        self.channels
            .get_or_try_insert_with(&key, || Polling::new(options, cluster, transport.clone()))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

pub fn polling_key(
    host: &str,
    app_id: &str,
    cluster: &str,
) -> String {
    create_key(&[host, app_id, cluster])
}
