//! Client configuration

use std::time::Duration;

use crate::error::Error;

/// Settings fixed when the client is built.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use dca_transport::TransportConfig;
///
/// let config = TransportConfig::default()
///     .with_base_path("/api/v2")
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Path prefix relative request URLs are resolved under.
    ///
    /// Default: `/api`
    pub base_path: String,

    /// Timeout applied to requests that do not set their own.
    ///
    /// Default: 60 seconds
    pub timeout: Duration,

    /// Cookie the CSRF token is read from.
    ///
    /// Default: `csrfToken`
    pub csrf_cookie: String,

    /// Header the CSRF token is sent in.
    ///
    /// Default: `x-csrf-token`
    pub csrf_header: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_path: "/api".to_string(),
            timeout: Duration::from_millis(60_000),
            csrf_cookie: "csrfToken".to_string(),
            csrf_header: "x-csrf-token".to_string(),
        }
    }
}

impl TransportConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the environment.
    ///
    /// Recognises `DCA_API_BASE_PATH`, `DCA_API_TIMEOUT_MS`,
    /// `DCA_CSRF_COOKIE` and `DCA_CSRF_HEADER`; unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(base_path) = lookup("DCA_API_BASE_PATH") {
            config.base_path = base_path;
        }
        if let Some(timeout) = lookup("DCA_API_TIMEOUT_MS") {
            let millis = timeout.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!(
                    "DCA_API_TIMEOUT_MS '{}' is not a number of milliseconds: {}",
                    timeout, e
                ))
            })?;
            config.timeout = Duration::from_millis(millis);
        }
        if let Some(cookie) = lookup("DCA_CSRF_COOKIE") {
            config.csrf_cookie = cookie;
        }
        if let Some(header) = lookup("DCA_CSRF_HEADER") {
            config.csrf_header = header;
        }
        Ok(config)
    }

    /// Sets the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the default timeout.
    ///
    /// A zero timeout disables the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the CSRF cookie name.
    pub fn with_csrf_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.csrf_cookie = cookie.into();
        self
    }

    /// Sets the CSRF header name.
    pub fn with_csrf_header(mut self, header: impl Into<String>) -> Self {
        self.csrf_header = header.into();
        self
    }
}
