//! Entry point of the client: one application id on one config service.

use std::sync::Arc;

use tracing::info;

use crate::config::validate_name;
use crate::registry::Registry;
use crate::ClientOptions;
use crate::Cluster;
use crate::FetchError;
use crate::HttpTransport;
use crate::Namespace;
use crate::OptionField;
use crate::PollingRegistry;
use crate::ReqwestTransport;
use crate::Result;

/// Root of the Application → Cluster → Namespace hierarchy.
///
/// Every level memoizes its children, so navigating twice to the same
/// cluster or namespace yields the very same `Arc` and its subscribers keep
/// receiving events. Must be used inside a Tokio runtime.
pub struct Application {
    options: Arc<ClientOptions>,
    transport: Arc<dyn HttpTransport>,
    polling_registry: Arc<PollingRegistry>,
    clusters: Registry<Cluster>,
}

impl Application {
    /// Talks to the config service over HTTP with `reqwest`
    pub fn new(options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new().map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self::with_transport(options, Arc::new(transport)))
    }

    pub fn with_transport(
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::with_registry(options, transport, Arc::new(PollingRegistry::new()))
    }

    /// Applications sharing `polling_registry` share notification channels
    /// for identical (host, app_id, cluster).
    pub fn with_registry(
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
        polling_registry: Arc<PollingRegistry>,
    ) -> Self {
        info!("application {} on {}", options.app_id(), options.host());
        Self {
            options: Arc::new(options),
            transport,
            polling_registry,
            clusters: Registry::new(),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn polling_registry(&self) -> &Arc<PollingRegistry> {
        &self.polling_registry
    }

    /// Cluster `name`; an empty name means the configured default cluster
    pub fn cluster(
        &self,
        name: &str,
    ) -> Result<Arc<Cluster>> {
        let name = if name.is_empty() { self.options.cluster() } else { name };
        validate_name(OptionField::Cluster, name)?;

        self.clusters.get_or_try_insert_with(name, || {
            Cluster::new(
                self.options.clone(),
                name,
                self.transport.clone(),
                &self.polling_registry,
            )
        })
    }

    /// Namespace `name` of the default cluster
    pub fn namespace(
        &self,
        name: &str,
    ) -> Result<Arc<Namespace>> {
        self.cluster("")?.namespace(name)
    }
}
