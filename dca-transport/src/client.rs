//! Main TransportClient

use std::sync::Arc;

use reqwest::Client;
use reqwest::Method;
use reqwest::cookie::CookieStore;
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde_json::Value;
use url::Url;

use crate::config::TransportConfig;
use crate::credentials::CredentialProvider;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::interceptor::AuthInterceptor;
use crate::interceptor::EnvelopeInterceptor;
use crate::interceptor::RequestInterceptor;
use crate::interceptor::ResponseInterceptor;
use crate::navigate::LogNavigator;
use crate::navigate::Navigator;
use crate::request::RequestConfig;
use crate::response::HttpResponse;

/// The shared client every API call goes through.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks safely. Each call runs the request interceptors, dispatches
/// the request with the CSRF header and its cancellation handle, decodes the
/// body and hands it to the envelope interceptor.
///
/// # Example
///
/// ```ignore
/// use dca_transport::{RequestConfig, StaticCredentials, TransportClient};
///
/// let client = TransportClient::builder()
///     .origin("https://app.example.com")
///     .credentials(StaticCredentials::new("my-token"))
///     .build()?;
///
/// let envelope = client.send(RequestConfig::get("/user/info")).await?;
/// ```
#[derive(Clone)]
pub struct TransportClient {
    inner: Arc<TransportClientInner>,
}

struct TransportClientInner {
    origin: Url,
    config: TransportConfig,
    http_client: Client,
    cookies: Arc<Jar>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptor: Arc<dyn ResponseInterceptor>,
}

impl TransportClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> TransportClientBuilder<Missing, Missing> {
        TransportClientBuilder::new()
    }

    /// Sends a request through the full pipeline.
    ///
    /// Resolves with the envelope of a status-`0` response. Rejections carry
    /// the envelope status ([`Error::Api`]), the HTTP status of a non-2xx
    /// response ([`Error::Http`]), or the network or cancellation failure.
    pub async fn send(&self, config: RequestConfig) -> Result<Envelope, Error> {
        let config = self.prepare(config).await?;
        match self.dispatch(config).await {
            Ok(response) => self.inner.response_interceptor.on_response(response).await,
            Err(error) => Err(self.inner.response_interceptor.on_response_error(error).await),
        }
    }

    /// Sends a request, skipping envelope interpretation.
    ///
    /// Request interceptors still run, and non-2xx responses still fail with
    /// [`Error::Http`].
    pub async fn send_raw(&self, config: RequestConfig) -> Result<HttpResponse, Error> {
        let config = self.prepare(config).await?;
        self.dispatch(config).await
    }

    /// Sends a GET request to `path`.
    pub async fn get(&self, path: &str) -> Result<Envelope, Error> {
        self.send(RequestConfig::get(path)).await
    }

    /// Sends a POST request with a JSON body to `path`.
    pub async fn post(&self, path: &str, body: Value) -> Result<Envelope, Error> {
        self.send(RequestConfig::post(path).json(body)).await
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Returns the cookie jar used for the CSRF token.
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.inner.cookies
    }

    /// Resolves a request path against the origin and base path.
    ///
    /// Absolute URLs are used as they are.
    pub fn resolve_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, Error> {
        let mut url = match Url::parse(path) {
            Ok(url) => url,
            Err(_) => {
                let base = format!(
                    "{}{}",
                    self.inner.origin.as_str().trim_end_matches('/'),
                    self.inner.config.base_path.trim_end_matches('/')
                );
                let full = format!("{}/{}", base, path.trim_start_matches('/'));
                Url::parse(&full).map_err(|e| Error::InvalidUrl(format!("{}: {}", full, e)))?
            }
        };
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Merges defaults and runs the request interceptors.
    async fn prepare(&self, mut config: RequestConfig) -> Result<RequestConfig, Error> {
        if config.timeout.is_none() {
            config.timeout = Some(self.inner.config.timeout);
        }

        let mut interceptors = self.inner.request_interceptors.iter();
        while let Some(interceptor) = interceptors.next() {
            match interceptor.on_request(config).await {
                Ok(next) => config = next,
                Err(mut error) => {
                    for remaining in interceptors.by_ref() {
                        error = remaining.on_request_error(error).await;
                    }
                    return Err(error);
                }
            }
        }
        Ok(config)
    }

    async fn dispatch(&self, config: RequestConfig) -> Result<HttpResponse, Error> {
        let method = config.method.clone().unwrap_or(Method::GET);
        let url = self.resolve_url(&config.url, &config.query)?;

        let mut headers = HeaderMap::new();
        for (name, value) in config.headers.iter().flatten() {
            let (name, value) = header_pair(name, value)?;
            headers.insert(name, value);
        }
        if let Some(token) = self.csrf_token(&url) {
            let (name, value) = header_pair(&self.inner.config.csrf_header, &token)?;
            headers.insert(name, value);
        }

        let mut request = self
            .inner
            .http_client
            .request(method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = &config.body {
            request = request.json(body);
        }

        log::debug!("{} {}", method, url);

        let exchange = async {
            let response = request.send().await?;
            HttpResponse::read(response).await
        };

        let response = match &config.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    reason = cancel.cancelled() => {
                        log::debug!("{} {} aborted: {}", method, url, reason);
                        return Err(Error::Cancelled(reason));
                    }
                    result = exchange => result?,
                }
            }
            None => exchange.await?,
        };

        log::trace!("{} {} -> {}", method, url, response.status());
        response.error_for_status()
    }

    fn csrf_token(&self, url: &Url) -> Option<String> {
        let cookies = self.inner.cookies.cookies(url)?;
        let cookies = cookies.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.inner.config.csrf_cookie).then(|| value.to_string())
        })
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::invalid_header(name))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| Error::invalid_header(name))?;
    Ok((header_name, header_value))
}

impl std::fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("origin", &self.inner.origin.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`TransportClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `origin` - Scheme and host the base path is resolved against
/// - `credentials` - A [`CredentialProvider`] implementation
///
/// # Example
///
/// ```ignore
/// let client = TransportClient::builder()
///     .origin("https://app.example.com")
///     .credentials(session)
///     .navigator(router)
///     .config(TransportConfig::from_env()?)
///     .build()?;
/// ```
pub struct TransportClientBuilder<Origin, Credentials> {
    origin: Origin,
    credentials: Credentials,
    config: TransportConfig,
    navigator: Option<Arc<dyn Navigator>>,
    http_client: Option<Client>,
    cookies: Option<Arc<Jar>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl TransportClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            origin: Missing,
            credentials: Missing,
            config: TransportConfig::default(),
            navigator: None,
            http_client: None,
            cookies: None,
            request_interceptors: Vec::new(),
        }
    }
}

impl Default for TransportClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TransportClientBuilder<Missing, C> {
    /// Sets the origin, e.g. `https://app.example.com`.
    pub fn origin(self, origin: impl Into<String>) -> TransportClientBuilder<Set<String>, C> {
        TransportClientBuilder {
            origin: Set(origin.into()),
            credentials: self.credentials,
            config: self.config,
            navigator: self.navigator,
            http_client: self.http_client,
            cookies: self.cookies,
            request_interceptors: self.request_interceptors,
        }
    }
}

impl<O> TransportClientBuilder<O, Missing> {
    /// Sets the credential provider.
    pub fn credentials<P: CredentialProvider + 'static>(
        self,
        provider: P,
    ) -> TransportClientBuilder<O, Set<Arc<dyn CredentialProvider>>> {
        TransportClientBuilder {
            origin: self.origin,
            credentials: Set(Arc::new(provider) as Arc<dyn CredentialProvider>),
            config: self.config,
            navigator: self.navigator,
            http_client: self.http_client,
            cookies: self.cookies,
            request_interceptors: self.request_interceptors,
        }
    }
}

impl<O, C> TransportClientBuilder<O, C> {
    /// Sets the configuration.
    ///
    /// Defaults to [`TransportConfig::default`].
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the navigator used for status-code redirects.
    ///
    /// Defaults to [`LogNavigator`].
    pub fn navigator<N: Navigator + 'static>(mut self, navigator: N) -> Self {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// The client must use the same cookie jar passed to
    /// [`cookie_jar`](Self::cookie_jar), or no CSRF token will be found.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the cookie jar.
    ///
    /// If not set, a fresh jar is created.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Appends a request interceptor, run after the auth interceptor.
    pub fn request_interceptor<I: RequestInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }
}

impl TransportClientBuilder<Set<String>, Set<Arc<dyn CredentialProvider>>> {
    /// Builds the [`TransportClient`].
    ///
    /// This method is only available when both `origin` and `credentials` have been set.
    pub fn build(self) -> Result<TransportClient, Error> {
        let origin = Url::parse(&self.origin.0)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.origin.0, e)))?;
        let cookies = self.cookies.unwrap_or_default();

        let http_client = match self.http_client {
            Some(client) => client,
            None => Client::builder().cookie_provider(cookies.clone()).build()?,
        };

        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(LogNavigator) as Arc<dyn Navigator>);

        let mut request_interceptors: Vec<Arc<dyn RequestInterceptor>> =
            vec![Arc::new(AuthInterceptor::new(self.credentials.0))];
        request_interceptors.extend(self.request_interceptors);

        Ok(TransportClient {
            inner: Arc::new(TransportClientInner {
                origin,
                config: self.config,
                http_client,
                cookies,
                request_interceptors,
                response_interceptor: Arc::new(EnvelopeInterceptor::new(navigator)),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    fn client() -> TransportClient {
        TransportClient::builder()
            .origin("http://127.0.0.1:8080")
            .credentials(StaticCredentials::anonymous())
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_url_under_base_path() {
        let client = client();
        let url = client.resolve_url("/user/info", &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/user/info");

        let url = client
            .resolve_url(
                "plan/list",
                &[
                    ("page".to_string(), "2".to_string()),
                    ("q".to_string(), "a b".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/plan/list?page=2&q=a+b");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let url = client().resolve_url("https://cdn.example.com/coins.json", &[]).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/coins.json");
    }

    #[test]
    fn test_build_rejects_bad_origin() {
        let result = TransportClient::builder()
            .origin("not a url")
            .credentials(StaticCredentials::anonymous())
            .build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_csrf_token_from_jar() {
        let client = client();
        let url = Url::parse("http://127.0.0.1:8080/api/user/info").unwrap();
        assert_eq!(client.csrf_token(&url), None);

        client.cookies().add_cookie_str("csrfToken=abc123; Path=/", &url);
        client.cookies().add_cookie_str("lang=en; Path=/", &url);
        assert_eq!(client.csrf_token(&url).as_deref(), Some("abc123"));
    }
}
