use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::Notification;
use crate::config::validate_name;
use crate::constants::HTTP_NOT_MODIFIED;
use crate::constants::HTTP_OK;
use crate::query_update;
use crate::ClientOptions;
use crate::HttpTransport;
use crate::OptionField;
use crate::PollingError;
use crate::PollingEvent;
use crate::Result;
use crate::RetryPolicy;

/// Notification channel of one cluster.
///
/// Keeps the last seen `notificationId` of every namespace and runs a single
/// long-poll loop as a spawned task while it is enabled and has at least one
/// namespace registered. Retry decisions are delegated to the configured
/// [`RetryPolicy`]; once it abandons, the channel never polls again.
pub struct Polling {
    host: String,
    app_id: String,
    cluster: String,
    polling_timeout: Duration,
    retry_policy: Arc<dyn RetryPolicy>,
    transport: Arc<dyn HttpTransport>,

    namespaces: Mutex<BTreeSet<String>>,
    notification_ids: Mutex<HashMap<String, i64>>,

    enabled: AtomicBool,
    abandoned: AtomicBool,
    running: AtomicBool,

    events: broadcast::Sender<PollingEvent>,
}

impl Polling {
    /// Creates a disabled channel. Nothing is requested until [`enable`]
    /// is called with `true` and a namespace is registered.
    ///
    /// Fails with `INVALID_CLUSTER` when `cluster` is not a valid identifier.
    ///
    /// [`enable`]: Polling::enable
    pub fn new(
        options: &ClientOptions,
        cluster: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        validate_name(OptionField::Cluster, cluster)?;

        let (events, _) = broadcast::channel(options.event_capacity());
        Ok(Self {
            host: options.host().to_string(),
            app_id: options.app_id().to_string(),
            cluster: cluster.to_string(),
            polling_timeout: options.polling_timeout(),
            retry_policy: options.retry_policy(),
            transport,
            namespaces: Mutex::new(BTreeSet::new()),
            notification_ids: Mutex::new(HashMap::new()),
            enabled: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
            running: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollingEvent> {
        self.events.subscribe()
    }

    /// Registers interest in a namespace identifier and starts polling if
    /// the channel is idle.
    pub fn add_namespace(
        self: &Arc<Self>,
        identifier: &str,
    ) {
        if self.namespaces.lock().insert(identifier.to_string()) {
            debug!("[{}] watching namespace {}", self.cluster, identifier);
        }
        self.maybe_start();
    }

    /// Stopping takes effect once the in-flight request settles.
    pub fn enable(
        self: &Arc<Self>,
        enable: bool,
    ) {
        self.enabled.store(enable, Ordering::Release);
        self.maybe_start();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.lock().iter().cloned().collect()
    }

    pub fn notification_id(
        &self,
        identifier: &str,
    ) -> Option<i64> {
        self.notification_ids.lock().get(identifier).copied()
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster
    }

    fn should_run(&self) -> bool {
        self.is_enabled() && !self.is_abandoned() && !self.namespaces.lock().is_empty()
    }

    fn maybe_start(self: &Arc<Self>) {
        if !self.should_run() {
            return;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        info!("[{}] start long polling", self.cluster);
        tokio::spawn(Self::run(Arc::downgrade(self)));
    }

    /// Holds the channel strongly only for the duration of one cycle, so
    /// the loop ends once every owner is gone.
    async fn run(channel: Weak<Self>) {
        let mut retries: u32 = 0;

        while let Some(this) = channel.upgrade() {
            if this.poll_cycle(&mut retries).await {
                continue;
            }

            this.running.store(false, Ordering::Release);
            // enable(true) may have raced with the exit above
            this.maybe_start();
            return;
        }
    }

    /// Returns `false` once the loop has to stop
    async fn poll_cycle(
        &self,
        retries: &mut u32,
    ) -> bool {
        if !self.is_enabled() {
            debug!("[{}] polling disabled, leaving loop", self.cluster);
            return false;
        }

        match self.poll_once().await {
            Ok(notifications) => {
                self.apply(notifications);
                *retries = 0;
            }
            Err(e) => {
                let decision = self.retry_policy.decide(*retries);
                if decision.abandon {
                    error!("[{}] polling abandoned after {} retries: {}", self.cluster, retries, e);
                    self.abandoned.store(true, Ordering::Release);
                    let _ = self.events.send(PollingEvent::Abandoned);
                    return false;
                }

                warn!(
                    "[{}] polling failed ({}), retry #{} in {:?}",
                    self.cluster, e, retries, decision.delay
                );
                tokio::time::sleep(decision.delay).await;
                *retries = if decision.reset { 0 } else { retries.saturating_add(1) };
            }
        }
        true
    }

    /// One long-poll round trip. A 304 yields no notifications.
    async fn poll_once(&self) -> Result<Vec<Notification>> {
        let notifications = self.notifications_param()?;
        let url = query_update(&self.host, &self.app_id, &self.cluster, &notifications)?;

        let response = match tokio::time::timeout(self.polling_timeout, self.transport.get(&url)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(PollingError::Request(e.to_string()).into()),
            Err(_) => {
                return Err(
                    PollingError::Request(format!("no response within {:?}", self.polling_timeout)).into(),
                )
            }
        };

        match response.status {
            HTTP_NOT_MODIFIED => Ok(Vec::new()),
            HTTP_OK => Ok(serde_json::from_str(&response.body).map_err(PollingError::JsonParse)?),
            status => Err(PollingError::Status(status).into()),
        }
    }

    fn notifications_param(&self) -> Result<String> {
        let namespaces = self.namespaces.lock().clone();
        let ids = self.notification_ids.lock();

        let list: Vec<Notification> = namespaces
            .into_iter()
            .map(|ns| Notification {
                notification_id: ids.get(&ns).copied(),
                namespace_name: ns,
            })
            .collect();

        Ok(serde_json::to_string(&list).map_err(PollingError::JsonParse)?)
    }

    fn apply(
        &self,
        notifications: Vec<Notification>,
    ) {
        let mut updated = Vec::new();
        {
            let mut ids = self.notification_ids.lock();
            for n in notifications {
                let Some(id) = n.notification_id else {
                    continue;
                };
                match ids.insert(n.namespace_name.clone(), id) {
                    None => debug!("[{}] {} first seen at version {}", self.cluster, n.namespace_name, id),
                    Some(prev) if prev != id => {
                        debug!("[{}] {} moved {} -> {}", self.cluster, n.namespace_name, prev, id);
                        updated.push(n.namespace_name);
                    }
                    Some(_) => {}
                }
            }
        }

        for identifier in updated {
            let _ = self.events.send(PollingEvent::Update(identifier));
        }
    }
}

impl std::fmt::Debug for Polling {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Polling")
            .field("host", &self.host)
            .field("app_id", &self.app_id)
            .field("cluster", &self.cluster)
            .field("enabled", &self.is_enabled())
            .field("abandoned", &self.is_abandoned())
            .field("running", &self.is_running())
            .finish()
    }
}
