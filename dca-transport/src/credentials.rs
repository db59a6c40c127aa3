//! CredentialProvider trait

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;

/// Supplies the credential attached to outgoing requests.
///
/// The client calls `token` before each request and sends whatever comes
/// back verbatim in the `Authorization` header. Returning `None` sends the
/// request unauthenticated. The client only ever reads; writing and
/// clearing the credential (login, logout) belongs to whoever owns the
/// provider, such as a [`SessionStore`](crate::storage::SessionStore).
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use dca_transport::{CredentialProvider, Error};
///
/// struct FromKeyring;
///
/// #[async_trait]
/// impl CredentialProvider for FromKeyring {
///     async fn token(&self) -> Result<Option<String>, Error> {
///         Ok(keyring_lookup("dca"))
///     }
/// }
/// ```
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the current credential, if any.
    async fn token(&self) -> Result<Option<String>, Error>;
}

#[async_trait]
impl<T> CredentialProvider for Arc<T>
where
    T: CredentialProvider + ?Sized,
{
    async fn token(&self) -> Result<Option<String>, Error> {
        (**self).token().await
    }
}

/// A provider that always returns the same credential.
///
/// Useful for tests and scripts.
///
/// # Example
///
/// ```
/// use dca_transport::StaticCredentials;
///
/// let credentials = StaticCredentials::new("my-test-token");
/// let anonymous = StaticCredentials::anonymous();
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// Creates a provider returning `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Creates a provider with no credential.
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn token(&self) -> Result<Option<String>, Error> {
        Ok(self.token.clone())
    }
}
