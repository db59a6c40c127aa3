//! Credential persistence
//!
//! A small async key-value layer standing in for the browser's local
//! storage, and a [`SessionStore`] on top of it that owns the signed-in
//! session.

mod memory;
mod session;
mod sqlite;

pub use memory::*;
pub use session::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::error::Error;

/// Trait for string key-value stores.
///
/// # Example
///
/// ```ignore
/// use dca_transport::storage::{InMemoryStore, KeyValueStore};
///
/// let store = InMemoryStore::new();
/// store.set("lang", "en").await?;
/// assert_eq!(store.get("lang").await?.as_deref(), Some("en"));
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieves a value by key.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Stores a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Removes a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), Error>;

    /// Removes every value.
    async fn clear(&self) -> Result<(), Error>;
}
