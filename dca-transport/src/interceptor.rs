//! Request and response interceptors

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelHandle;
use crate::credentials::CredentialProvider;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::navigate::Navigator;
use crate::request::RequestConfig;
use crate::response::HttpResponse;

// =============================================================================
// Traits
// =============================================================================

/// Rewrites outgoing requests before dispatch.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Transforms the request.
    async fn on_request(&self, config: RequestConfig) -> Result<RequestConfig, Error>;

    /// Sees errors raised by earlier interceptors. Passes them through by
    /// default.
    async fn on_request_error(&self, error: Error) -> Error {
        error
    }
}

/// Interprets responses after dispatch.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Turns a 2xx response into an envelope or a rejection.
    async fn on_response(&self, response: HttpResponse) -> Result<Envelope, Error>;

    /// Sees dispatch errors (network, HTTP status, cancellation). Passes
    /// them through by default.
    async fn on_response_error(&self, error: Error) -> Error {
        error
    }
}

// =============================================================================
// AuthInterceptor
// =============================================================================

/// Attaches the credential and arms the request timeout.
///
/// Requests without a method or without a header map are passed through
/// untouched. Otherwise:
///
/// - the credential, if any, is sent raw in `Authorization` (no scheme),
///   replacing any caller-supplied spelling of that header;
/// - a positive timeout replaces `cancel` with a fresh handle carrying that
///   deadline, linked to the previous handle so cancelling the caller's
///   handle still cancels the request with the caller's reason. A zero or
///   missing timeout leaves `cancel` as it was.
pub struct AuthInterceptor {
    credentials: Arc<dyn CredentialProvider>,
}

impl AuthInterceptor {
    /// Creates an interceptor reading from `credentials`.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl RequestInterceptor for AuthInterceptor {
    async fn on_request(&self, mut config: RequestConfig) -> Result<RequestConfig, Error> {
        if config.method.is_none() {
            return Ok(config);
        }
        let Some(headers) = config.headers.as_mut() else {
            return Ok(config);
        };

        if let Some(token) = self.credentials.token().await? {
            headers.retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
            headers.insert("Authorization".to_string(), token);
        }

        if let Some(timeout) = config.timeout.filter(|timeout| !timeout.is_zero()) {
            let handle = match config.cancel.take() {
                Some(previous) => CancelHandle::linked_to(&previous, Some(timeout)),
                None => CancelHandle::with_deadline(timeout),
            };
            config.cancel = Some(handle);
        }

        Ok(config)
    }
}

// =============================================================================
// EnvelopeInterceptor
// =============================================================================

/// Unwraps the status envelope and routes error codes.
///
/// - status `0` resolves with the whole envelope;
/// - any other status rejects with [`Error::Api`];
/// - `40005` additionally navigates to `/activate` and `40008` to
///   `/purchase`.
pub struct EnvelopeInterceptor {
    navigator: Arc<dyn Navigator>,
}

impl EnvelopeInterceptor {
    /// Creates an interceptor navigating through `navigator`.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

#[async_trait]
impl ResponseInterceptor for EnvelopeInterceptor {
    async fn on_response(&self, response: HttpResponse) -> Result<Envelope, Error> {
        let envelope = Envelope::from_body(response.into_body())?;
        if envelope.is_success() {
            return Ok(envelope);
        }

        let error = Error::api(envelope.status(), envelope.message().unwrap_or_default());
        log::warn!("request rejected: {}", error);
        if let Some(target) = error.navigation_target() {
            self.navigator.navigate(target);
        }
        Err(error)
    }
}
