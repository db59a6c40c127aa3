//! Per-call request configuration

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::cancel::CancelHandle;
use crate::error::Error;

/// One outgoing request, before and after the request interceptors.
///
/// Built per call and never persisted. The helper constructors ([`get`],
/// [`post`], ...) set a method and an empty header map; a config built with
/// [`RequestConfig::new`] has neither, and the auth interceptor leaves such
/// configs alone.
///
/// [`get`]: RequestConfig::get
/// [`post`]: RequestConfig::post
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use dca_transport::RequestConfig;
/// use serde_json::json;
///
/// let request = RequestConfig::post("/plan/create")
///     .json(json!({"symbol": "BTCUSDT", "amount": "50"}))
///     .query("lang", "en")
///     .timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Path under the base path, or an absolute URL.
    pub url: String,
    /// HTTP method; dispatched as GET when absent.
    pub method: Option<Method>,
    /// Request headers.
    pub headers: Option<HashMap<String, String>>,
    /// Time allowed before the request is cancelled. Zero means none.
    pub timeout: Option<Duration>,
    /// Handle cancelling the request.
    pub cancel: Option<CancelHandle>,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
}

impl RequestConfig {
    /// Creates a bare config with no method and no headers.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Creates a config with the given method and an empty header map.
    pub fn with_method(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Some(method),
            headers: Some(HashMap::new()),
            ..Default::default()
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::with_method(Method::GET, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::with_method(Method::POST, url)
    }

    /// Creates a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::with_method(Method::PUT, url)
    }

    /// Creates a PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::with_method(Method::PATCH, url)
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::with_method(Method::DELETE, url)
    }

    /// Sets a header, creating the header map if needed.
    ///
    /// Replaces any header whose name differs only in case.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let headers = self.headers.get_or_insert_with(HashMap::new);
        headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        headers.insert(name, value.into());
        self
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` as the JSON body.
    pub fn json_from<T: Serialize>(self, body: &T) -> Result<Self, Error> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation handle.
    pub fn cancel_with(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Returns a header value, if set.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
