//! Access to the Eventory REST backend.
//!
//! `Transport` is the seam between the typed client and the wire. `ReqwestTransport` talks HTTP to
//! the configured backend. `TestBackend` answers from seeded in-memory data, which lets the whole
//! app run top-to-bottom without a server (see `Mode`).

mod client;
mod http;
mod session;
mod test_backend;

pub use client::{ApiClient, Registered};
pub(crate) use client::validate_email;
pub use http::ReqwestTransport;
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore, Tokens};
pub use test_backend::{TestBackend, TEST_PASSWORD, TEST_USERNAME};

use crate::clock::{Clock, SystemClock};
use crate::error::{ErrorType, IntoResult, Result};
use crate::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// When this environment variable is set and non-empty, `Mode::from_env` selects `Mode::Test`.
pub const TEST_MODE_VAR: &str = "EVENTORY_IN_TEST_MODE";

/// Which backend the client talks to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The configured REST backend.
    #[default]
    Http,
    /// The seeded in-memory `TestBackend`.
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

serde_plain::derive_display_from_serialize!(Method);

/// A request to the backend. `path` is relative to the base URL, e.g. `/sales`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Delete, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// The value of the query parameter `key`, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A response from the backend. A body that is not JSON arrives as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The backend's `message` field, or the body itself when it is a plain string.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            Value::String(s) => Some(s.as_str()),
            other => other.get("message").and_then(Value::as_str),
        }
    }
}

/// Sends requests to a backend. Failing to get any response is an error; an HTTP error status is
/// not, it is returned in `ApiResponse::status`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse>;
}

#[async_trait::async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse> {
        self.as_ref().send(request).await
    }
}

/// Creates a client for `mode`. Tokens are kept in the configured token file in both modes, so a
/// login survives between invocations.
pub async fn client(config: &Config, mode: Mode) -> Result<ApiClient> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path()));
    let transport: Box<dyn Transport> = match mode {
        Mode::Http => Box::new(
            ReqwestTransport::new(config.base_url(), config.timeout())
                .pub_result(ErrorType::Config)?,
        ),
        Mode::Test => Box::new(TestBackend::default()),
    };
    Ok(ApiClient::new(transport, Session::new(store, clock)))
}
