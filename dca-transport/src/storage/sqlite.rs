//! SQLite-backed persistent store implementation.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite::OptionalExtension;
use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::Error;

/// A persistent store backed by SQLite.
///
/// Data is stored in a SQLite database file and survives process restarts,
/// which is what keeps a user signed in between runs. Uses WAL journal mode.
///
/// # Example
///
/// ```ignore
/// use dca_transport::storage::SqliteStore;
///
/// // File-based store
/// let store = SqliteStore::open("session.db").await?;
///
/// // In-memory store (for testing)
/// let store = SqliteStore::open_in_memory().await?;
/// ```
pub struct SqliteStore {
    client: Client,
}

impl SqliteStore {
    /// Opens a SQLite store at the specified path.
    ///
    /// Creates the database file and table if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory SQLite store.
    ///
    /// Useful for testing. Data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), async_sqlite::Error> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS storage (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL
                    )",
                    [],
                )?;
                Ok(())
            })
            .await
    }

    /// Returns the number of entries.
    pub async fn len(&self) -> Result<usize, Error> {
        let count = self
            .client
            .conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM storage", [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await?;
        Ok(count as usize)
    }

    /// Returns `true` if the store is empty.
    pub async fn is_empty(&self) -> Result<bool, Error> {
        self.len().await.map(|len| len == 0)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();

        let value = self
            .client
            .conn(move |conn| {
                conn.query_row("SELECT value FROM storage WHERE key = ?", [key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()
            })
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO storage (key, value) VALUES (?, ?)",
                    [key, value],
                )
            })
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();

        self.client
            .conn(move |conn| conn.execute("DELETE FROM storage WHERE key = ?", [key]))
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.client
            .conn(|conn| conn.execute("DELETE FROM storage", []))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);

        store.set("token", "abc").await.unwrap();
        store.set("token", "def").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("def"));
        assert_eq!(store.len().await.unwrap(), 1);

        store.remove("token").await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }
}
