//! Namespace synchronizer.
//!
//! A [`Namespace`] owns one live snapshot and keeps it in step with the config
//! service:
//! - `ready()` bootstraps from the network or the local cache, composing both
//!   errors when neither works
//! - `fetch()` pulls the latest state, diffs it against the current snapshot
//!   and announces per-key changes before the terminal `Updated` event
//! - an optional periodic timer re-fetches every `fetch_interval`
//!
//! Steady-state failures never surface as `Err`; they are delivered as
//! [`NamespaceEvent::FetchError`] / [`NamespaceEvent::SaveError`].

mod namespace_type;
pub use namespace_type::*;


use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::validate_name;
use crate::constants::HTTP_NOT_MODIFIED;
use crate::constants::HTTP_OK;
use crate::diff;
use crate::query_config;
use crate::query_config_as_json;
use crate::CacheError;
use crate::ClientOptions;
use crate::ConfigEndpoint;
use crate::Error;
use crate::FetchError;
use crate::HttpTransport;
use crate::LocalCache;
use crate::NamespaceEvent;
use crate::OptionField;
use crate::Result;
use crate::Snapshot;

/// Body of the uncached config endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    configurations: Snapshot,

    #[serde(default)]
    release_key: Option<String>,
}

pub struct Namespace {
    options: Arc<ClientOptions>,
    cluster: String,
    name: String,
    namespace_type: NamespaceType,
    identifier: String,
    transport: Arc<dyn HttpTransport>,
    cache: Option<LocalCache>,

    snapshot: ArcSwapOption<Snapshot>,
    release_key: Mutex<Option<String>>,

    ready: AtomicBool,
    ready_lock: tokio::sync::Mutex<()>,
    // One fetch at a time per namespace
    fetch_lock: tokio::sync::Mutex<()>,
    save_lock: Arc<tokio::sync::Mutex<()>>,

    fetch_enabled: AtomicBool,
    fetch_timer: Mutex<Option<JoinHandle<()>>>,

    events: broadcast::Sender<NamespaceEvent>,
}

impl Namespace {
    pub fn new(
        options: Arc<ClientOptions>,
        cluster: &str,
        name: &str,
        namespace_type: NamespaceType,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        validate_name(OptionField::Cluster, cluster)?;
        validate_name(OptionField::Namespace, name)?;

        let identifier = namespace_type.identifier(name);
        let cache = options
            .cache_dir()
            .map(|dir| LocalCache::new(dir, options.host(), options.app_id(), cluster, &identifier));
        let (events, _) = broadcast::channel(options.event_capacity());
        let fetch_enabled = options.enable_fetch();

        Ok(Self {
            options,
            cluster: cluster.to_string(),
            name: name.to_string(),
            namespace_type,
            identifier,
            transport,
            cache,
            snapshot: ArcSwapOption::empty(),
            release_key: Mutex::new(None),
            ready: AtomicBool::new(false),
            ready_lock: tokio::sync::Mutex::new(()),
            fetch_lock: tokio::sync::Mutex::new(()),
            save_lock: Arc::new(tokio::sync::Mutex::new(())),
            fetch_enabled: AtomicBool::new(fetch_enabled),
            fetch_timer: Mutex::new(None),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NamespaceEvent> {
        self.events.subscribe()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster
    }

    pub fn namespace_type(&self) -> NamespaceType {
        self.namespace_type
    }

    /// Wire name, `name` or `name.ext`
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn release_key(&self) -> Option<String> {
        self.release_key.lock().clone()
    }

    pub fn local_cache(&self) -> Option<&LocalCache> {
        self.cache.as_ref()
    }

    pub fn is_fetch_enabled(&self) -> bool {
        self.fetch_enabled.load(Ordering::SeqCst)
    }

    /// Copy of the current snapshot
    pub fn config(&self) -> Result<Snapshot> {
        self.current("config").map(|s| (*s).clone())
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.current("get").map(|s| s.get(key).cloned())
    }

    pub fn has(
        &self,
        key: &str,
    ) -> Result<bool> {
        self.current("has").map(|s| s.contains_key(key))
    }

    /// Bootstraps the snapshot. Idempotent; concurrent callers wait for the
    /// first bootstrap and share its outcome once it succeeded.
    pub async fn ready(self: &Arc<Self>) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        let _guard = self.ready_lock.lock().await;
        if self.is_ready() {
            return Ok(());
        }

        let (snapshot, from_network) = if self.options.skip_init_fetch_if_cache_found() {
            self.bootstrap_prefer_cache().await?
        } else {
            self.bootstrap_prefer_network().await?
        };

        let snapshot = Arc::new(snapshot);
        self.snapshot.store(Some(snapshot.clone()));
        if from_network {
            self.save_in_background(snapshot.clone());
        }

        self.ready.store(true, Ordering::SeqCst);
        info!(
            "[{}/{}] ready with {} keys from {}",
            self.cluster,
            self.identifier,
            snapshot.len(),
            if from_network { "config service" } else { "local cache" }
        );
        let _ = self.events.send(NamespaceEvent::Ready);

        if self.is_fetch_enabled() {
            self.arm_timer();
        }
        Ok(())
    }

    async fn bootstrap_prefer_network(&self) -> Result<(Snapshot, bool)> {
        let fetch_err = match self.request_initial().await {
            Ok(snapshot) => return Ok((snapshot, true)),
            Err(e) => e,
        };

        warn!(
            "[{}/{}] initial fetch failed, falling back to local cache: {}",
            self.cluster, self.identifier, fetch_err
        );
        let _ = self
            .events
            .send(NamespaceEvent::FetchError(Arc::new(fetch_err.clone().into())));

        match self.read_cache().await {
            Ok(snapshot) => Ok((snapshot, false)),
            Err(cache_err) => Err(Error::compose(fetch_err.into(), cache_err)),
        }
    }

    async fn bootstrap_prefer_cache(&self) -> Result<(Snapshot, bool)> {
        let cache_err = match self.read_cache().await {
            Ok(snapshot) => return Ok((snapshot, false)),
            Err(e) => e,
        };

        debug!("[{}/{}] no usable cache ({}), fetching", self.cluster, self.identifier, cache_err);
        match self.request_initial().await {
            Ok(snapshot) => Ok((snapshot, true)),
            Err(fetch_err) => Err(Error::compose(cache_err, fetch_err.into())),
        }
    }

    /// Pulls the latest state once. A no-op until the namespace is ready.
    ///
    /// `use_cache` selects the cache-friendly endpoint, which never answers
    /// 304 but may lag behind the uncached one.
    pub async fn fetch(
        &self,
        use_cache: bool,
    ) {
        if !self.is_ready() {
            debug!("[{}/{}] fetch skipped, not ready", self.cluster, self.identifier);
            return;
        }

        let _in_flight = self.fetch_lock.lock().await;
        match self.request(use_cache).await {
            Ok(None) => debug!("[{}/{}] not modified", self.cluster, self.identifier),
            Ok(Some(snapshot)) => self.commit(snapshot),
            Err(e) => {
                warn!("[{}/{}] fetch failed: {}", self.cluster, self.identifier, e);
                let _ = self.events.send(NamespaceEvent::FetchError(Arc::new(e.into())));
            }
        }
    }

    /// Toggles the periodic re-fetch timer.
    ///
    /// Before `ready()` this only records the intent. Disabling stops the
    /// timer without cancelling a fetch already in flight.
    pub fn enable_fetch(
        self: &Arc<Self>,
        enable: bool,
    ) {
        self.fetch_enabled.store(enable, Ordering::SeqCst);

        if !enable {
            if let Some(timer) = self.fetch_timer.lock().take() {
                timer.abort();
                info!("[{}/{}] periodic fetch stopped", self.cluster, self.identifier);
            }
            return;
        }

        if self.is_ready() {
            self.arm_timer();
        }
    }

    fn arm_timer(self: &Arc<Self>) {
        let mut timer = self.fetch_timer.lock();
        if timer.is_some() {
            return;
        }

        let period = self.options.fetch_interval();
        let use_cache = self.options.fetch_cached_config();
        let namespace = Arc::downgrade(self);

        info!(
            "[{}/{}] periodic fetch every {:?}",
            self.cluster, self.identifier, period
        );
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(namespace) = namespace.upgrade() else {
                    break;
                };
                tokio::spawn(async move {
                    namespace.fetch(use_cache).await;
                });
            }
        }));
    }

    fn current(
        &self,
        accessor: &'static str,
    ) -> Result<Arc<Snapshot>> {
        if !self.is_ready() {
            return Err(Error::NotReady(accessor));
        }
        self.snapshot.load_full().ok_or(Error::NotReady(accessor))
    }

    fn commit(
        &self,
        new: Snapshot,
    ) {
        let old = self.snapshot.load_full().unwrap_or_default();
        let changes = diff(&old, &new);
        if changes.is_empty() {
            debug!("[{}/{}] fetched identical snapshot", self.cluster, self.identifier);
            return;
        }

        let new = Arc::new(new);
        self.snapshot.store(Some(new.clone()));
        debug!(
            "[{}/{}] {} key changes: {} added, {} changed, {} deleted",
            self.cluster,
            self.identifier,
            changes.len(),
            changes.added.len(),
            changes.changed.len(),
            changes.deleted.len()
        );

        for key in changes.added {
            let value = new.get(&key).cloned().unwrap_or_default();
            let _ = self.events.send(NamespaceEvent::Added { key, value });
        }
        for key in changes.changed {
            let old_value = old.get(&key).cloned().unwrap_or_default();
            let new_value = new.get(&key).cloned().unwrap_or_default();
            let _ = self.events.send(NamespaceEvent::Changed {
                key,
                old_value,
                new_value,
            });
        }
        for key in changes.deleted {
            let old_value = old.get(&key).cloned().unwrap_or_default();
            let _ = self.events.send(NamespaceEvent::Deleted { key, old_value });
        }
        let _ = self.events.send(NamespaceEvent::Updated {
            old,
            new: new.clone(),
        });

        self.save_in_background(new);
    }

    fn save_in_background(
        &self,
        snapshot: Arc<Snapshot>,
    ) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let events = self.events.clone();
        let save_lock = self.save_lock.clone();

        tokio::spawn(async move {
            let _guard = save_lock.lock().await;
            match cache.write(&snapshot).await {
                Ok(()) => {
                    let _ = events.send(NamespaceEvent::Saved);
                }
                Err(e) => {
                    warn!("{}", e);
                    let _ = events.send(NamespaceEvent::SaveError(Arc::new(e)));
                }
            }
        });
    }

    async fn read_cache(&self) -> Result<Snapshot> {
        match &self.cache {
            Some(cache) => cache.read().await,
            None => Err(CacheError::NoCacheSpecified.into()),
        }
    }

    /// Uncached fetch during bootstrap, where "not modified" is meaningless
    async fn request_initial(&self) -> std::result::Result<Snapshot, FetchError> {
        self.request(false)
            .await?
            .ok_or(FetchError::Status(HTTP_NOT_MODIFIED))
    }

    /// One round trip. `Ok(None)` means not modified.
    async fn request(
        &self,
        use_cache: bool,
    ) -> std::result::Result<Option<Snapshot>, FetchError> {
        let endpoint = ConfigEndpoint {
            host: self.options.host(),
            app_id: self.options.app_id(),
            cluster: &self.cluster,
            namespace: &self.identifier,
            ip: self.options.ip(),
            data_center: self.options.data_center(),
        };
        let url = if use_cache {
            query_config_as_json(&endpoint)
        } else {
            let release_key = self.release_key();
            query_config(&endpoint, release_key.as_deref())
        }
        .map_err(|e| FetchError::Request(e.to_string()))?;

        let call = self.transport.get(&url);
        let response = match self.options.fetch_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| FetchError::Timeout(limit))?,
            None => call.await,
        }
        .map_err(|e| FetchError::Request(e.to_string()))?;

        match response.status {
            HTTP_NOT_MODIFIED => Ok(None),
            HTTP_OK if use_cache => {
                let snapshot: Snapshot =
                    serde_json::from_str(&response.body).map_err(|e| FetchError::JsonParse(Arc::new(e)))?;
                Ok(Some(snapshot))
            }
            HTTP_OK => {
                let body: ConfigResponse =
                    serde_json::from_str(&response.body).map_err(|e| FetchError::JsonParse(Arc::new(e)))?;
                if let Some(release_key) = body.release_key {
                    *self.release_key.lock() = Some(release_key);
                }
                Ok(Some(body.configurations))
            }
            status => Err(FetchError::Status(status)),
        }
    }
}

impl Drop for Namespace {
    fn drop(&mut self) {
        if let Some(timer) = self.fetch_timer.get_mut().take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("cluster", &self.cluster)
            .field("identifier", &self.identifier)
            .field("ready", &self.is_ready())
            .finish()
    }
}
