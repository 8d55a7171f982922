//! Storage adapter: the key-value port used by both registries.
//!
//! [`KeyValueStore`] models a small hash/list key-value store (the subset
//! of Redis the application relies on). Two backends implement it:
//!
//! - [`MemoryStore`] keeps everything in process; used by tests and for
//!   single-node deployments where losing state on restart is acceptable.
//! - [`PostgresStore`] persists hashes and lists in PostgreSQL via `sqlx`.
//!
//! Registries receive an `Arc<dyn KeyValueStore>` built once at startup by
//! [`connect`].

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::config::{AppConfig, StorageBackend};

/// Field map stored under a single hash key.
pub type Fields = BTreeMap<String, String>;

/// Failure reported by a storage backend.
///
/// Callers treat every variant as "storage unavailable"; the split only
/// decides whether a write is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection to the backing store was lost or could not be acquired.
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("backend operation failed: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns `true` when the failure is a lost or missing connection.
    #[must_use]
    pub const fn is_connection_loss(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Hash/list key-value store contract.
///
/// All keys live in one namespace; callers prefix them (`pet:`,
/// `kingdom:`). Expired keys behave exactly like absent keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Merges `fields` into the hash at `key`, creating it if absent.
    ///
    /// An existing expiry on the key is preserved.
    async fn put(&self, key: &str, fields: &Fields) -> Result<(), StorageError>;

    /// Returns every field of the hash at `key`, or `None` if absent.
    async fn get_all(&self, key: &str) -> Result<Option<Fields>, StorageError>;

    /// Deletes the hash at `key`. Returns whether a live key was removed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Deletes the hash at `key` only if its `field` still equals
    /// `expected`. Returns whether the hash was removed.
    async fn delete_if(
        &self,
        key: &str,
        field: &str,
        expected: &str,
    ) -> Result<bool, StorageError>;

    /// Lists live hash keys starting with `prefix`, in store order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Sets a time-to-live on `key`. Returns `false` if the key is absent.
    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<bool, StorageError>;

    /// Returns whether a live hash exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Prepends `value` to the list at `list_key`.
    async fn push_to_list(&self, list_key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes every occurrence of `value` from the list at `list_key`.
    ///
    /// Returns the number of removed elements.
    async fn remove_from_list(&self, list_key: &str, value: &str) -> Result<u64, StorageError>;

    /// Returns the full list at `list_key`, most recently pushed first.
    async fn range_list(&self, list_key: &str) -> Result<Vec<String>, StorageError>;

    /// Physically reclaims keys whose time-to-live has elapsed.
    ///
    /// Returns the number of reclaimed keys.
    async fn purge_expired(&self) -> Result<u64, StorageError>;

    /// Round-trips to the backend to confirm it is reachable.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Releases backend connections. Called once on shutdown.
    async fn close(&self);
}

/// Builds the configured storage backend.
///
/// # Errors
///
/// Returns [`StorageError`] if the PostgreSQL pool cannot be created or
/// its migrations fail.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::info!("using in-memory storage backend");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(config).await?;
            tracing::info!("connected to postgres storage backend");
            Ok(Arc::new(store))
        }
    }
}
