//! PostgreSQL implementation of [`KeyValueStore`].
//!
//! Hashes are rows of `kv_hashes` with a JSONB field map and an optional
//! `expires_at`; lists are rows of `kv_lists` ordered by a serial id.
//! Writes that fail because the connection was lost are retried once.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::{Fields, KeyValueStore, StorageError};
use crate::config::AppConfig;

/// Predicate shared by every read: the row has no expiry or it lies ahead.
const LIVE: &str = "(expires_at IS NULL OR expires_at > now())";

/// PostgreSQL-backed key-value store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    ///
    /// The schema is expected to exist; see [`PostgresStore::connect`].
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from configuration and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the database cannot be
    /// reached and [`StorageError::Backend`] if a migration fails.
    pub async fn connect(config: &AppConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(map_sqlx)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Backend(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Runs a write, retrying once if the first attempt lost its connection.
    async fn write_with_retry<T, F, Fut>(
        &self,
        op: &'static str,
        mut attempt: F,
    ) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        match attempt().await.map_err(map_sqlx) {
            Err(err) if err.is_connection_loss() => {
                tracing::warn!(op, error = %err, "storage write lost connection; retrying once");
                attempt().await.map_err(map_sqlx)
            }
            other => other,
        }
    }
}

/// Classifies a `sqlx` error as connection loss or backend failure.
fn map_sqlx(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StorageError::Unavailable(err.to_string()),
        other => StorageError::Backend(other.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn put(&self, key: &str, fields: &Fields) -> Result<(), StorageError> {
        let sql = format!(
            "INSERT INTO kv_hashes (key, fields) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET \
               fields = CASE WHEN {LIVE_OLD} THEN kv_hashes.fields || EXCLUDED.fields ELSE EXCLUDED.fields END, \
               expires_at = CASE WHEN {LIVE_OLD} THEN kv_hashes.expires_at ELSE NULL END",
            LIVE_OLD = "(kv_hashes.expires_at IS NULL OR kv_hashes.expires_at > now())"
        );
        self.write_with_retry("put", || {
            sqlx::query(&sql)
                .bind(key)
                .bind(Json(fields))
                .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn get_all(&self, key: &str) -> Result<Option<Fields>, StorageError> {
        let sql = format!("SELECT fields FROM kv_hashes WHERE key = $1 AND {LIVE}");
        let row = sqlx::query_scalar::<_, Json<Fields>>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(|Json(fields)| fields))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let sql = format!("DELETE FROM kv_hashes WHERE key = $1 AND {LIVE}");
        let result = self
            .write_with_retry("delete", || sqlx::query(&sql).bind(key).execute(&self.pool))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_if(
        &self,
        key: &str,
        field: &str,
        expected: &str,
    ) -> Result<bool, StorageError> {
        let sql =
            format!("DELETE FROM kv_hashes WHERE key = $1 AND fields ->> $2 = $3 AND {LIVE}");
        let result = self
            .write_with_retry("delete_if", || {
                sqlx::query(&sql)
                    .bind(key)
                    .bind(field)
                    .bind(expected)
                    .execute(&self.pool)
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let sql = format!(
            "SELECT key FROM kv_hashes WHERE left(key, char_length($1)) = $1 AND {LIVE} ORDER BY key"
        );
        sqlx::query_scalar::<_, String>(&sql)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<bool, StorageError> {
        let sql = format!(
            "UPDATE kv_hashes SET expires_at = now() + make_interval(secs => $2) \
             WHERE key = $1 AND {LIVE}"
        );
        let secs = seconds as f64;
        let result = self
            .write_with_retry("set_expiry", || {
                sqlx::query(&sql).bind(key).bind(secs).execute(&self.pool)
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM kv_hashes WHERE key = $1 AND {LIVE})");
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn push_to_list(&self, list_key: &str, value: &str) -> Result<(), StorageError> {
        self.write_with_retry("push_to_list", || {
            sqlx::query("INSERT INTO kv_lists (list_key, value) VALUES ($1, $2)")
                .bind(list_key)
                .bind(value)
                .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn remove_from_list(&self, list_key: &str, value: &str) -> Result<u64, StorageError> {
        let result = self
            .write_with_retry("remove_from_list", || {
                sqlx::query("DELETE FROM kv_lists WHERE list_key = $1 AND value = $2")
                    .bind(list_key)
                    .bind(value)
                    .execute(&self.pool)
            })
            .await?;
        Ok(result.rows_affected())
    }

    async fn range_list(&self, list_key: &str) -> Result<Vec<String>, StorageError> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM kv_lists WHERE list_key = $1 ORDER BY id DESC",
        )
        .bind(list_key)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let result = self
            .write_with_retry("purge_expired", || {
                sqlx::query(
                    "DELETE FROM kv_hashes WHERE expires_at IS NOT NULL AND expires_at <= now()",
                )
                .execute(&self.pool)
            })
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("postgres pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_count_as_connection_loss() {
        assert!(map_sqlx(sqlx::Error::PoolTimedOut).is_connection_loss());
        assert!(map_sqlx(sqlx::Error::PoolClosed).is_connection_loss());
    }

    #[test]
    fn row_errors_are_backend_failures() {
        assert!(!map_sqlx(sqlx::Error::RowNotFound).is_connection_loss());
    }

    #[test]
    fn missing_column_is_backend_failure() {
        let err = map_sqlx(sqlx::Error::ColumnNotFound("fields".to_string()));
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
