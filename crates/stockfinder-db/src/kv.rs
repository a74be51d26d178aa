//! Database operations for the `kv_entries` table.

use futures::future::{BoxFuture, FutureExt};
use sqlx::PgPool;
use stockfinder_core::{PersistenceError, PersistentKeyValueStore};

/// Fetch the value stored under `key`, if any.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_kv_entry(pool: &PgPool, key: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

/// Insert or replace the value stored under `key`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn put_kv_entry(pool: &PgPool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO kv_entries (key, value) VALUES ($1, $2) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete `key`. Missing keys are not an error.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn delete_kv_entry(pool: &PgPool, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM kv_entries WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// [`PersistentKeyValueStore`] backed by the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PersistentKeyValueStore for PgKeyValueStore {
    fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>> {
        async move {
            get_kv_entry(&self.pool, key)
                .await
                .map_err(|e| PersistenceError::new("read", key, e.to_string()))
        }
        .boxed()
    }

    fn write<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            put_kv_entry(&self.pool, key, value)
                .await
                .map_err(|e| PersistenceError::new("write", key, e.to_string()))
        }
        .boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            delete_kv_entry(&self.pool, key)
                .await
                .map_err(|e| PersistenceError::new("remove", key, e.to_string()))
        }
        .boxed()
    }
}
