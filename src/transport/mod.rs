//! HTTP transport capability.
//!
//! The core only needs "GET this URL, give me status and body". Timeouts are
//! raced by the callers, so implementations should not impose their own.

mod http;
mod endpoints;
pub use http::*;
pub use endpoints::*;

#[cfg(test)]
mod endpoints_test;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Request(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn get(
        &self,
        url: &str,
    ) -> std::result::Result<HttpResponse, TransportError>;
}
