//! In-process stand-in for the config service, served with `warp`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::sync::Notify;
use tokio::time::Instant;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Filter;
use warp::Reply;

/// How long a long-poll request is held open without changes
pub const HOLD: Duration = Duration::from_secs(1);

pub const APP_ID: &str = "SampleApp";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Notification {
    namespace_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification_id: Option<i64>,
}

#[derive(Default)]
struct Inner {
    configs: HashMap<String, HashMap<String, String>>,
    notification_ids: HashMap<String, i64>,
    failing: bool,
    fetch_delay: Duration,
}

#[derive(Default)]
struct State {
    inner: Mutex<Inner>,
    changed: Notify,
}

impl State {
    fn release_key(
        &self,
        namespace: &str,
    ) -> Option<String> {
        self.inner
            .lock()
            .notification_ids
            .get(namespace)
            .map(|id| format!("release-{id}"))
    }

    /// Entries whose server version differs from what the client sent
    fn changed_since(
        &self,
        requested: &[Notification],
    ) -> Vec<Notification> {
        let inner = self.inner.lock();
        requested
            .iter()
            .filter_map(|n| {
                let current = *inner.notification_ids.get(&n.namespace_name)?;
                (n.notification_id != Some(current)).then(|| Notification {
                    namespace_name: n.namespace_name.clone(),
                    notification_id: Some(current),
                })
            })
            .collect()
    }
}

pub struct MockConfigService {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockConfigService {
    pub fn start() -> Self {
        let state = Arc::new(State::default());
        let (tx, rx) = oneshot::channel::<()>();

        let (addr, server) =
            warp::serve(routes(state.clone())).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                rx.await.ok();
            });
        tokio::spawn(server);

        Self {
            addr,
            state,
            shutdown: Some(tx),
        }
    }

    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replaces the namespace content and bumps its release
    pub fn publish(
        &self,
        namespace: &str,
        pairs: &[(&str, &str)],
    ) {
        {
            let mut inner = self.state.inner.lock();
            inner.configs.insert(
                namespace.to_string(),
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            *inner.notification_ids.entry(namespace.to_string()).or_insert(0) += 1;
        }
        self.state.changed.notify_waiters();
    }

    /// Every config request answers 500 while set
    pub fn set_failing(
        &self,
        failing: bool,
    ) {
        self.state.inner.lock().failing = failing;
    }

    pub fn set_fetch_delay(
        &self,
        delay: Duration,
    ) {
        self.state.inner.lock().fetch_delay = delay;
    }
}

impl Drop for MockConfigService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn routes(state: Arc<State>) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let configs = warp::path!("configs" / String / String / String)
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state.clone())
        .and_then(handle_config);

    let config_files = warp::path!("configfiles" / "json" / String / String / String)
        .and(with_state.clone())
        .and_then(handle_config_file);

    let notifications = warp::path!("notifications" / "v2")
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state)
        .and_then(handle_notifications);

    warp::get().and(configs.or(config_files).unify().or(notifications).unify())
}

/// Applies the configured failure / delay, then returns the namespace content
async fn lookup(
    state: &State,
    namespace: &str,
) -> Result<HashMap<String, String>, StatusCode> {
    let (failing, delay) = {
        let inner = state.inner.lock();
        (inner.failing, inner.fetch_delay)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if failing {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state
        .inner
        .lock()
        .configs
        .get(namespace)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

async fn handle_config(
    app_id: String,
    cluster: String,
    namespace: String,
    query: HashMap<String, String>,
    state: Arc<State>,
) -> Result<Response, Infallible> {
    let configurations = match lookup(&state, &namespace).await {
        Ok(c) => c,
        Err(status) => return Ok(status.into_response()),
    };
    let release_key = state.release_key(&namespace);
    if release_key.is_some() && query.get("releaseKey") == release_key.as_ref() {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    Ok(warp::reply::json(&serde_json::json!({
        "appId": app_id,
        "cluster": cluster,
        "namespaceName": namespace,
        "configurations": configurations,
        "releaseKey": release_key,
    }))
    .into_response())
}

async fn handle_config_file(
    _app_id: String,
    _cluster: String,
    namespace: String,
    state: Arc<State>,
) -> Result<Response, Infallible> {
    Ok(match lookup(&state, &namespace).await {
        Ok(configurations) => warp::reply::json(&configurations).into_response(),
        Err(status) => status.into_response(),
    })
}

async fn handle_notifications(
    query: HashMap<String, String>,
    state: Arc<State>,
) -> Result<Response, Infallible> {
    let requested: Vec<Notification> = match query
        .get("notifications")
        .and_then(|raw| serde_json::from_str(raw).ok())
    {
        Some(list) => list,
        None => return Ok(StatusCode::BAD_REQUEST.into_response()),
    };

    let deadline = Instant::now() + HOLD;
    loop {
        let notified = state.changed.notified();
        let changed = state.changed_since(&requested);
        if !changed.is_empty() {
            return Ok(warp::reply::json(&changed).into_response());
        }
        if tokio::time::timeout_at(deadline, notified).await.is_err() {
            return Ok(StatusCode::NOT_MODIFIED.into_response());
        }
    }
}
