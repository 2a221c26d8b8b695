use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tracing::warn;

use super::LinearRetryPolicy;
use super::RetryPolicy;
use crate::constants::DEFAULT_CLUSTER;
use crate::constants::DEFAULT_EVENT_CAPACITY;
use crate::constants::DEFAULT_FETCH_INTERVAL;
use crate::constants::DEFAULT_NAMESPACE;
use crate::constants::DEFAULT_POLLING_TIMEOUT;
use crate::constants::DEFAULT_RETRY_UNIT_DELAY;
use crate::constants::LONG_POLL_SERVER_WAIT;
use crate::OptionField;
use crate::OptionsError;
use crate::Result;

/// Validated client options.
///
/// Only obtainable through [`ClientOptionsBuilder::build`], so every consumer
/// downstream can rely on the values being well-formed.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the config service, e.g. `http://127.0.0.1:8080`
    pub(crate) host: String,

    pub(crate) app_id: String,

    /// Default cluster for [`crate::Application::cluster`] with an empty name
    /// Default: "default"
    pub(crate) cluster: String,

    /// Default namespace for [`crate::Application::namespace`] with an empty name
    /// Default: "application"
    pub(crate) namespace: String,

    /// Client IP, forwarded for gray releases
    pub(crate) ip: Option<String>,

    pub(crate) data_center: Option<String>,

    /// Races every config fetch when set
    /// Default: none
    pub(crate) fetch_timeout: Option<Duration>,

    /// Period of the optional re-fetch timer
    /// Default: 5 minutes
    pub(crate) fetch_interval: Duration,

    /// Periodic fetches use the cache-friendly endpoint
    /// Default: true
    pub(crate) fetch_cached_config: bool,

    /// Start the long-poll channel for new clusters
    /// Default: true
    pub(crate) enable_update_notification: bool,

    pub(crate) retry_policy: Arc<dyn RetryPolicy>,

    /// Client side bound of one long-poll request
    /// Default: 65 seconds
    pub(crate) polling_timeout: Duration,

    /// Bootstrap from the local cache when present, skipping the network
    /// Default: false
    pub(crate) skip_init_fetch_if_cache_found: bool,

    /// Arm the periodic re-fetch timer once ready
    /// Default: false
    pub(crate) enable_fetch: bool,

    /// Directory for snapshot cache files. No caching when unset.
    pub(crate) cache_dir: Option<PathBuf>,

    /// Buffered events per subscriber before lagging receivers drop some
    /// Default: 256
    pub(crate) event_capacity: usize,
}

impl ClientOptions {
    pub fn builder(
        host: impl Into<String>,
        app_id: impl Into<String>,
    ) -> ClientOptionsBuilder {
        ClientOptionsBuilder::new(host, app_id)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn data_center(&self) -> Option<&str> {
        self.data_center.as_deref()
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }

    pub fn fetch_interval(&self) -> Duration {
        self.fetch_interval
    }

    pub fn fetch_cached_config(&self) -> bool {
        self.fetch_cached_config
    }

    pub fn enable_update_notification(&self) -> bool {
        self.enable_update_notification
    }

    pub fn retry_policy(&self) -> Arc<dyn RetryPolicy> {
        self.retry_policy.clone()
    }

    pub fn polling_timeout(&self) -> Duration {
        self.polling_timeout
    }

    pub fn skip_init_fetch_if_cache_found(&self) -> bool {
        self.skip_init_fetch_if_cache_found
    }

    pub fn enable_fetch(&self) -> bool {
        self.enable_fetch
    }

    pub fn cache_dir(&self) -> Option<&PathBuf> {
        self.cache_dir.as_ref()
    }

    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

pub struct ClientOptionsBuilder {
    host: String,
    app_id: String,
    cluster: String,
    namespace: String,
    ip: Option<String>,
    data_center: Option<String>,
    fetch_timeout: Option<Duration>,
    fetch_interval: Duration,
    fetch_cached_config: bool,
    enable_update_notification: bool,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    retry_unit_delay: Duration,
    polling_timeout: Duration,
    skip_init_fetch_if_cache_found: bool,
    enable_fetch: bool,
    cache_dir: Option<PathBuf>,
    event_capacity: usize,
}

impl ClientOptionsBuilder {
    pub fn new(
        host: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            app_id: app_id.into(),
            cluster: DEFAULT_CLUSTER.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            ip: None,
            data_center: None,
            fetch_timeout: None,
            fetch_interval: DEFAULT_FETCH_INTERVAL,
            fetch_cached_config: true,
            enable_update_notification: true,
            retry_policy: None,
            retry_unit_delay: DEFAULT_RETRY_UNIT_DELAY,
            polling_timeout: DEFAULT_POLLING_TIMEOUT,
            skip_init_fetch_if_cache_found: false,
            enable_fetch: false,
            cache_dir: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn cluster(
        mut self,
        cluster: impl Into<String>,
    ) -> Self {
        self.cluster = cluster.into();
        self
    }

    pub fn namespace(
        mut self,
        namespace: impl Into<String>,
    ) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn ip(
        mut self,
        ip: impl Into<String>,
    ) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn data_center(
        mut self,
        data_center: impl Into<String>,
    ) -> Self {
        self.data_center = Some(data_center.into());
        self
    }

    pub fn fetch_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn fetch_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.fetch_interval = interval;
        self
    }

    pub fn fetch_cached_config(
        mut self,
        enable: bool,
    ) -> Self {
        self.fetch_cached_config = enable;
        self
    }

    pub fn enable_update_notification(
        mut self,
        enable: bool,
    ) -> Self {
        self.enable_update_notification = enable;
        self
    }

    /// Replaces the default [`LinearRetryPolicy`]. Takes precedence over
    /// [`retry_unit_delay`](Self::retry_unit_delay).
    pub fn retry_policy(
        mut self,
        policy: impl RetryPolicy,
    ) -> Self {
        self.retry_policy = Some(Arc::new(policy));
        self
    }

    /// Tunes the unit of the default linear retry policy (default: 10s)
    pub fn retry_unit_delay(
        mut self,
        unit: Duration,
    ) -> Self {
        self.retry_unit_delay = unit;
        self
    }

    pub fn polling_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.polling_timeout = timeout;
        self
    }

    pub fn skip_init_fetch_if_cache_found(
        mut self,
        enable: bool,
    ) -> Self {
        self.skip_init_fetch_if_cache_found = enable;
        self
    }

    pub fn enable_fetch(
        mut self,
        enable: bool,
    ) -> Self {
        self.enable_fetch = enable;
        self
    }

    pub fn cache_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn event_capacity(
        mut self,
        capacity: usize,
    ) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validates every field once and freezes the options
    pub fn build(self) -> Result<ClientOptions> {
        validate_host(&self.host)?;
        validate_name(OptionField::AppId, &self.app_id)?;
        validate_name(OptionField::Cluster, &self.cluster)?;
        validate_name(OptionField::Namespace, &self.namespace)?;
        validate_not_blank(OptionField::Ip, self.ip.as_deref())?;
        validate_not_blank(OptionField::DataCenter, self.data_center.as_deref())?;

        if let Some(timeout) = self.fetch_timeout {
            validate_positive(OptionField::FetchTimeout, timeout)?;
        }
        validate_positive(OptionField::FetchInterval, self.fetch_interval)?;
        validate_positive(OptionField::PollingTimeout, self.polling_timeout)?;
        if self.polling_timeout <= LONG_POLL_SERVER_WAIT {
            warn!(
                "polling_timeout {:?} does not exceed the server hold time {:?}, idle long polls will time out",
                self.polling_timeout, LONG_POLL_SERVER_WAIT
            );
        }

        let cache_dir = self.cache_dir.map(resolve_cache_dir).transpose()?;

        if self.event_capacity == 0 {
            return Err(OptionsError::new(OptionField::EventCapacity, "must be greater than 0", "0").into());
        }

        let retry_policy = self
            .retry_policy
            .unwrap_or_else(|| Arc::new(LinearRetryPolicy::new(self.retry_unit_delay)));

        Ok(ClientOptions {
            host: self.host.trim_end_matches('/').to_string(),
            app_id: self.app_id,
            cluster: self.cluster,
            namespace: self.namespace,
            ip: self.ip,
            data_center: self.data_center,
            fetch_timeout: self.fetch_timeout,
            fetch_interval: self.fetch_interval,
            fetch_cached_config: self.fetch_cached_config,
            enable_update_notification: self.enable_update_notification,
            retry_policy,
            polling_timeout: self.polling_timeout,
            skip_init_fetch_if_cache_found: self.skip_init_fetch_if_cache_found,
            enable_fetch: self.enable_fetch,
            cache_dir,
            event_capacity: self.event_capacity,
        })
    }
}

/// `true` for non-empty names made of `[A-Za-z0-9_.-]`
pub(crate) fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

pub(crate) fn validate_name(
    field: OptionField,
    name: &str,
) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(OptionsError::new(field, "must be a non-empty identifier of [A-Za-z0-9_.-]", name).into())
    }
}

/// Anchors a relative cache directory to the current working directory, so
/// later `chdir` calls do not move the cache.
fn resolve_cache_dir(dir: PathBuf) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(OptionsError::new(OptionField::CacheDir, "must be a non-empty path", "").into());
    }
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = env::current_dir().map_err(|e| {
        OptionsError::new(
            OptionField::CacheDir,
            "cannot be resolved against the working directory",
            format!("{} ({e})", dir.display()),
        )
    })?;
    Ok(cwd.join(dir))
}

fn validate_host(host: &str) -> Result<()> {
    let invalid = || OptionsError::new(OptionField::Host, "must be an absolute http(s) URL", host);

    let url = Url::parse(host).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid().into());
    }
    Ok(())
}

fn validate_not_blank(
    field: OptionField,
    value: Option<&str>,
) -> Result<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(OptionsError::new(field, "must not be blank", v).into()),
        _ => Ok(()),
    }
}

fn validate_positive(
    field: OptionField,
    value: Duration,
) -> Result<()> {
    if value.is_zero() {
        return Err(OptionsError::new(field, "must be greater than 0", "0").into());
    }
    Ok(())
}
