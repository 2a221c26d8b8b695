//! A named deployment group of one application.
//!
//! All namespaces of a cluster share one notification channel. The cluster
//! routes channel signals to its namespaces: an update triggers an uncached
//! fetch of the affected namespace, abandonment switches every namespace to
//! periodic fetching.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::validate_name;
use crate::registry::Registry;
use crate::ClientOptions;
use crate::HttpTransport;
use crate::Namespace;
use crate::NamespaceType;
use crate::OptionField;
use crate::Polling;
use crate::PollingEvent;
use crate::PollingRegistry;
use crate::Result;

pub struct Cluster {
    options: Arc<ClientOptions>,
    name: String,
    transport: Arc<dyn HttpTransport>,
    polling: Arc<Polling>,
    namespaces: Arc<Registry<Namespace>>,
    /// Set once the channel gave up; new namespaces start with periodic fetch
    fallback_to_fetch: Arc<AtomicBool>,
    forwarder: JoinHandle<()>,
}

impl Cluster {
    pub fn new(
        options: Arc<ClientOptions>,
        name: &str,
        transport: Arc<dyn HttpTransport>,
        polling_registry: &PollingRegistry,
    ) -> Result<Self> {
        validate_name(OptionField::Cluster, name)?;

        let polling = polling_registry.get_or_create(&options, name, &transport)?;
        let namespaces = Arc::new(Registry::new());
        let fallback_to_fetch = Arc::new(AtomicBool::new(polling.is_abandoned()));

        let forwarder = tokio::spawn(forward_notifications(
            polling.subscribe(),
            Arc::downgrade(&namespaces),
            fallback_to_fetch.clone(),
            name.to_string(),
        ));
        polling.enable(options.enable_update_notification());

        debug!("cluster {} created", name);
        Ok(Self {
            options,
            name: name.to_string(),
            transport,
            polling,
            namespaces,
            fallback_to_fetch,
            forwarder,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polling(&self) -> &Arc<Polling> {
        &self.polling
    }

    /// Properties namespace `name`; an empty name means the default namespace
    pub fn namespace(
        &self,
        name: &str,
    ) -> Result<Arc<Namespace>> {
        self.namespace_with_type(name, NamespaceType::Properties)
    }

    /// Returns the same `Arc` for every call with the same wire identifier.
    pub fn namespace_with_type(
        &self,
        name: &str,
        namespace_type: NamespaceType,
    ) -> Result<Arc<Namespace>> {
        let name = if name.is_empty() { self.options.namespace() } else { name };
        validate_name(OptionField::Namespace, name)?;

        let identifier = namespace_type.identifier(name);
        let mut created = false;
        let namespace = self.namespaces.get_or_try_insert_with(&identifier, || {
            created = true;
            Namespace::new(
                self.options.clone(),
                &self.name,
                name,
                namespace_type,
                self.transport.clone(),
            )
        })?;

        if created {
            self.polling.add_namespace(&identifier);
            if self.fallback_to_fetch.load(Ordering::SeqCst) {
                namespace.enable_fetch(true);
            }
        }
        Ok(namespace)
    }

    pub fn namespaces(&self) -> Vec<Arc<Namespace>> {
        self.namespaces.values()
    }

    /// Starts or stops the shared long-poll channel
    pub fn enable_update_notification(
        &self,
        enable: bool,
    ) {
        self.polling.enable(enable);
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name)
            .field("namespaces", &self.namespaces.len())
            .finish()
    }
}

async fn forward_notifications(
    mut rx: broadcast::Receiver<PollingEvent>,
    namespaces: Weak<Registry<Namespace>>,
    fallback_to_fetch: Arc<AtomicBool>,
    cluster: String,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("[{}] {} notifications dropped, refetching all namespaces", cluster, skipped);
                None
            }
            Err(RecvError::Closed) => break,
        };
        let Some(namespaces) = namespaces.upgrade() else {
            break;
        };

        match event {
            Some(PollingEvent::Update(identifier)) => match namespaces.get(&identifier) {
                Some(namespace) => {
                    debug!("[{}] {} changed, fetching", cluster, identifier);
                    tokio::spawn(async move { namespace.fetch(false).await });
                }
                None => debug!("[{}] ignoring update of unknown namespace {}", cluster, identifier),
            },
            Some(PollingEvent::Abandoned) => {
                info!("[{}] notifications abandoned, switching to periodic fetch", cluster);
                fallback_to_fetch.store(true, Ordering::SeqCst);
                for namespace in namespaces.values() {
                    namespace.enable_fetch(true);
                }
            }
            None => {
                for namespace in namespaces.values() {
                    tokio::spawn(async move { namespace.fetch(false).await });
                }
            }
        }
    }
}
