//! Signed-in session on top of a key-value store

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::KeyValueStore;
use crate::credentials::CredentialProvider;
use crate::error::Error;

/// Key the credential is stored under.
pub const TOKEN_KEY: &str = "token";
/// Key of the `"true"`/`"false"` signed-in flag.
pub const AUTHENTICATED_KEY: &str = "isAuthenticated";
/// Key of the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// The signed-in session: credential, signed-in flag and user record.
///
/// Written at login, read on every request through its
/// [`CredentialProvider`] impl, cleared at logout.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use dca_transport::storage::{SessionStore, SqliteStore};
///
/// let session = Arc::new(SessionStore::new(SqliteStore::open("session.db").await?));
/// let client = TransportClient::builder()
///     .origin("https://app.example.com")
///     .credentials(session.clone())
///     .build()?;
///
/// let login = client.send(RequestConfig::post("/auth/login").json(form)).await?;
/// session.login(token, &user).await?;
/// ```
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a successful sign-in.
    pub async fn login<U: Serialize>(&self, token: &str, user: &U) -> Result<(), Error> {
        let user = serde_json::to_string(user)?;
        self.store.set(TOKEN_KEY, token).await?;
        self.store.set(AUTHENTICATED_KEY, "true").await?;
        self.store.set(USER_KEY, &user).await?;
        log::debug!("session stored");
        Ok(())
    }

    /// Clears the session.
    pub async fn logout(&self) -> Result<(), Error> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(AUTHENTICATED_KEY).await?;
        self.store.remove(USER_KEY).await?;
        log::debug!("session cleared");
        Ok(())
    }

    /// Returns the stored credential, if any.
    pub async fn token(&self) -> Result<Option<String>, Error> {
        Ok(self
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|token| !token.is_empty()))
    }

    /// Returns `true` if the signed-in flag is set.
    pub async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(self.store.get(AUTHENTICATED_KEY).await?.as_deref() == Some("true"))
    }

    /// Returns the stored user record, if any.
    pub async fn user<U: DeserializeOwned>(&self) -> Result<Option<U>, Error> {
        match self.store.get(USER_KEY).await? {
            Some(user) => Ok(Some(serde_json::from_str(&user)?)),
            None => Ok(None),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: KeyValueStore> CredentialProvider for SessionStore<S> {
    async fn token(&self) -> Result<Option<String>, Error> {
        SessionStore::token(self).await
    }
}
