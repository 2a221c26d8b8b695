//! Config Sync Error Hierarchy
//!
//! Errors are grouped by the layer that produces them. Every error maps to a
//! stable [`ErrorKind`] code so callers can branch on failure modes without
//! matching on messages.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Construction-time validation failures
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// Config service fetch failures
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Long-poll notification failures
    #[error(transparent)]
    Polling(#[from] PollingError),

    /// Local cache failures
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Accessor called before the namespace finished bootstrapping
    #[error("namespace is not ready, call ready() before {0}()")]
    NotReady(&'static str),

    /// Several failures that happened in sequence during bootstrap
    #[error(transparent)]
    Composed(#[from] ComposedError),

    /// Settings file / environment loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Option field names, used to build `INVALID_<FIELD>` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    Host,
    AppId,
    Cluster,
    Namespace,
    Ip,
    DataCenter,
    FetchTimeout,
    FetchInterval,
    PollingTimeout,
    CacheDir,
    EventCapacity,
}

impl OptionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionField::Host => "host",
            OptionField::AppId => "app_id",
            OptionField::Cluster => "cluster",
            OptionField::Namespace => "namespace",
            OptionField::Ip => "ip",
            OptionField::DataCenter => "data_center",
            OptionField::FetchTimeout => "fetch_timeout",
            OptionField::FetchInterval => "fetch_interval",
            OptionField::PollingTimeout => "polling_timeout",
            OptionField::CacheDir => "cache_dir",
            OptionField::EventCapacity => "event_capacity",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("options.{} {reason}, but got {value:?}", field.as_str())]
pub struct OptionsError {
    pub field: OptionField,
    pub reason: &'static str,
    pub value: String,
}

impl OptionsError {
    pub(crate) fn new(
        field: OptionField,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field,
            reason,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure
    #[error("fails to get config: {0}")]
    Request(String),

    /// Unexpected HTTP status
    #[error("config service got response status {0}")]
    Status(u16),

    /// Client-side timeout elapsed before the response
    #[error("config service did not respond within {0:?}")]
    Timeout(Duration),

    /// Malformed response body
    #[error("fails to parse JSON: {0}")]
    JsonParse(#[source] Arc<serde_json::Error>),
}

#[derive(Debug, thiserror::Error)]
pub enum PollingError {
    #[error("polling request fails: {0}")]
    Request(String),

    #[error("polling response status {0}")]
    Status(u16),

    #[error("polling result fails to parse: {0}")]
    JsonParse(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No cache directory configured to fall back to
    #[error("options.cache_dir not specified")]
    NoCacheSpecified,

    /// Cache file absent or not accessible
    #[error("local cache file {path:?} not found or not accessible: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file present but unreadable or corrupt
    #[error("fails to read local cache file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cache file could not be written
    #[error("fails to save local cache file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Ordered list of errors, e.g. "network failed, then cache failed".
#[derive(Debug)]
pub struct ComposedError {
    errors: Vec<Error>,
}

impl ComposedError {
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }
}

impl fmt::Display for ComposedError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ComposedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors.first().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Invalid(OptionField),
    InvalidSettings,
    FetchRequestError,
    FetchStatusError,
    FetchTimeout,
    JsonParseError,
    PollingError,
    PollingStatusError,
    PollingJsonParseError,
    NoLocalCacheFound,
    ReadLocalCacheFails,
    SaveLocalCacheFails,
    NoCacheSpecified,
    NotReady,
}

impl fmt::Display for ErrorKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let code = match self {
            ErrorKind::Invalid(field) => {
                return write!(f, "INVALID_{}", field.as_str().to_ascii_uppercase());
            }
            ErrorKind::InvalidSettings => "INVALID_SETTINGS",
            ErrorKind::FetchRequestError => "FETCH_REQUEST_ERROR",
            ErrorKind::FetchStatusError => "FETCH_STATUS_ERROR",
            ErrorKind::FetchTimeout => "FETCH_TIMEOUT",
            ErrorKind::JsonParseError => "JSON_PARSE_ERROR",
            ErrorKind::PollingError => "POLLING_ERROR",
            ErrorKind::PollingStatusError => "POLLING_STATUS_ERROR",
            ErrorKind::PollingJsonParseError => "POLLING_JSON_PARSE_ERROR",
            ErrorKind::NoLocalCacheFound => "NO_LOCAL_CACHE_FOUND",
            ErrorKind::ReadLocalCacheFails => "READ_LOCAL_CACHE_FAILS",
            ErrorKind::SaveLocalCacheFails => "SAVE_LOCAL_CACHE_FAILS",
            ErrorKind::NoCacheSpecified => "NO_CACHE_SPECIFIED",
            ErrorKind::NotReady => "NOT_READY",
        };
        f.write_str(code)
    }
}

impl Error {
    /// Primary error code. For a composed error this is the first error's code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Options(e) => ErrorKind::Invalid(e.field),
            Error::Fetch(FetchError::Request(_)) => ErrorKind::FetchRequestError,
            Error::Fetch(FetchError::Status(_)) => ErrorKind::FetchStatusError,
            Error::Fetch(FetchError::Timeout(_)) => ErrorKind::FetchTimeout,
            Error::Fetch(FetchError::JsonParse(_)) => ErrorKind::JsonParseError,
            Error::Polling(PollingError::Request(_)) => ErrorKind::PollingError,
            Error::Polling(PollingError::Status(_)) => ErrorKind::PollingStatusError,
            Error::Polling(PollingError::JsonParse(_)) => ErrorKind::PollingJsonParseError,
            Error::Cache(CacheError::NoCacheSpecified) => ErrorKind::NoCacheSpecified,
            Error::Cache(CacheError::NotFound { .. }) => ErrorKind::NoLocalCacheFound,
            Error::Cache(CacheError::Read { .. }) => ErrorKind::ReadLocalCacheFails,
            Error::Cache(CacheError::Save { .. }) => ErrorKind::SaveLocalCacheFails,
            Error::NotReady(_) => ErrorKind::NotReady,
            Error::Composed(c) => c
                .errors
                .first()
                .map(Error::kind)
                .unwrap_or(ErrorKind::InvalidSettings),
            Error::Config(_) => ErrorKind::InvalidSettings,
        }
    }

    /// All error codes in order, flattening composed errors.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self {
            Error::Composed(c) => c.errors.iter().flat_map(Error::kinds).collect(),
            e => vec![e.kind()],
        }
    }

    /// Joins two bootstrap failures, keeping their order.
    pub(crate) fn compose(
        first: Error,
        second: Error,
    ) -> Error {
        Error::Composed(ComposedError::new(vec![first, second]))
    }
}
