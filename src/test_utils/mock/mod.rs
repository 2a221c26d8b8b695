//! Deterministic stand-ins for the config service.
//!
//! [`MockHttpTransport`](crate::MockHttpTransport) covers single-call
//! expectations. [`ScriptedTransport`] replays a queue of responses per URL
//! pattern, which suits flows where fetches and long polls interleave. Once a
//! pattern's queue is exhausted, requests hang forever, like a long poll the
//! server never answers.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::HttpResponse;
use crate::HttpTransport;
use crate::TransportError;

pub(crate) const CONFIGS: &str = "/configs/";
pub(crate) const CONFIG_FILES: &str = "/configfiles/json/";
pub(crate) const NOTIFICATIONS: &str = "/notifications/v2";

struct Scripted {
    delay: Option<Duration>,
    result: std::result::Result<HttpResponse, TransportError>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        &self,
        pattern: &str,
        status: u16,
        body: impl Into<String>,
    ) -> &Self {
        self.push(pattern, None, Ok(HttpResponse::new(status, body)))
    }

    pub fn respond_after(
        &self,
        pattern: &str,
        delay: Duration,
        status: u16,
        body: impl Into<String>,
    ) -> &Self {
        self.push(pattern, Some(delay), Ok(HttpResponse::new(status, body)))
    }

    pub fn fail(
        &self,
        pattern: &str,
        error: TransportError,
    ) -> &Self {
        self.push(pattern, None, Err(error))
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn requests_to(
        &self,
        pattern: &str,
    ) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.contains(pattern))
            .cloned()
            .collect()
    }

    fn push(
        &self,
        pattern: &str,
        delay: Option<Duration>,
        result: std::result::Result<HttpResponse, TransportError>,
    ) -> &Self {
        let mut routes = self.routes.lock();
        let step = Scripted { delay, result };
        match routes.iter_mut().find(|(p, _)| p == pattern) {
            Some((_, queue)) => queue.push_back(step),
            None => routes.push((pattern.to_string(), VecDeque::from([step]))),
        }
        self
    }

    fn next_step(
        &self,
        url: &str,
    ) -> Option<Scripted> {
        let mut routes = self.routes.lock();
        routes
            .iter_mut()
            .filter(|(pattern, _)| url.contains(pattern.as_str()))
            .find_map(|(_, queue)| queue.pop_front())
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
    ) -> std::result::Result<HttpResponse, TransportError> {
        self.requests.lock().push(url.to_string());

        let Some(step) = self.next_step(url) else {
            return std::future::pending().await;
        };
        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }
        step.result
    }
}
