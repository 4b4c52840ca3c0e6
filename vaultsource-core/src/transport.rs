//! HTTP transport abstraction.
//!
//! The store protocol only needs "send one request, get status and body
//! back". This module provides:
//! - [`Transport`] - Trait for synchronous HTTP backends
//! - [`ReqwestTransport`] - Blocking `reqwest` implementation (default feature)
//! - [`MemoryTransport`] - Canned-response implementation for testing
//!
//! All calls block the calling thread. No retries and no timeout policy
//! beyond the backend's defaults.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;

use crate::error::VaultError;

/// Header carrying the client token on every authenticated call.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// HTTP method used by the store protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// An outgoing request.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header with this name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(n, v)| {
                if n.eq_ignore_ascii_case(TOKEN_HEADER) {
                    (n.as_str(), "[REDACTED]")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Synchronous HTTP capability used by the store client and token login.
///
/// Implementations return `Ok` for any HTTP status; only failures to obtain a
/// response at all are errors ([`VaultError::Transport`]).
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, VaultError>;
}

/// Blocking `reqwest` transport.
///
/// Must not be called from inside an async executor thread; use
/// `spawn_blocking` when embedding in async code.
#[cfg(feature = "reqwest-transport")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "reqwest-transport")]
impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Result<Self, VaultError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| VaultError::transport("", format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (proxies, TLS roots, timeouts).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest-transport")]
impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, VaultError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|e| VaultError::transport(&request.url, e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| VaultError::transport(&request.url, format!("failed to read body: {}", e)))?;

        tracing::trace!(method = %request.method, url = %request.url, status, "HTTP call completed");

        Ok(HttpResponse { status, body })
    }
}

/// In-memory transport for testing.
///
/// Answers from a table of canned responses keyed by method and URL and
/// records every request it receives. Unknown routes answer `404`.
#[derive(Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<(Method, String), HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the response for a route, replacing any previous one.
    pub fn respond(
        &self,
        method: Method,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> &Self {
        self.routes
            .lock()
            .insert((method, url.into()), HttpResponse::new(status, body));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests received for one URL.
    pub fn count_for(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("routes_count", &self.routes.lock().len())
            .field("requests_count", &self.requests.lock().len())
            .finish()
    }
}

impl Transport for MemoryTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, VaultError> {
        let response = self
            .routes
            .lock()
            .get(&(request.method, request.url.clone()))
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(404, r#"{"errors":[]}"#));
        self.requests.lock().push(request);
        Ok(response)
    }
}
