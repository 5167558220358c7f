//! Versioned key-value store over a single SQLite table.
//!
//! Every key holds one JSON document and a version stamp. Read-modify-write
//! goes through [`KvStore::update`], which serializes writers on the same key
//! inside this process and uses compare-and-set on the version so writers in
//! other processes cannot silently clobber each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::errors::AppError;

/// Attempts made by [`KvStore::update`] before giving up on a contended key.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// A stored document together with its version. Version 0 means "absent".
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

#[derive(Clone)]
pub struct KvStore {
    pool: SqlitePool,
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl KvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Read and deserialize a key. Absent keys return `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        Ok(self.get_versioned(key).await?.map(|v| v.value))
    }

    pub async fn get_versioned<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<Versioned<T>>, AppError> {
        let row = sqlx::query("SELECT value, version FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                let version: i64 = row.get("version");
                let value = serde_json::from_str(&raw)?;
                Ok(Some(Versioned { value, version }))
            }
            None => Ok(None),
        }
    }

    /// Unconditionally write a key, bumping its version. Seeds fixtures.
    #[cfg(test)]
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO kv (key, value, version, updated_at) VALUES (?, ?, 1, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                 version = kv.version + 1, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&json)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Write `value` only if the stored version still equals `expected_version`.
    ///
    /// Returns `false` when another writer got there first.
    pub async fn compare_and_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expected_version: i64,
    ) -> Result<bool, AppError> {
        let json = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        let result = if expected_version == 0 {
            sqlx::query(
                "INSERT INTO kv (key, value, version, updated_at) VALUES (?, ?, 1, ?)
                 ON CONFLICT(key) DO NOTHING",
            )
            .bind(key)
            .bind(&json)
            .bind(&now)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE kv SET value = ?, version = version + 1, updated_at = ?
                 WHERE key = ? AND version = ?",
            )
            .bind(&json)
            .bind(&now)
            .bind(key)
            .bind(expected_version)
            .execute(&self.pool)
            .await?
        };

        Ok(result.rows_affected() == 1)
    }

    /// Acquire the in-process writer lock for a key.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Read-modify-write a key. An absent key starts from `V::default()`.
    ///
    /// `apply` may run more than once when a concurrent writer bumps the
    /// version between our read and our write, so it must not have side
    /// effects outside the value it is given.
    pub async fn update<V, R, F>(&self, key: &str, mut apply: F) -> Result<R, AppError>
    where
        V: Serialize + DeserializeOwned + Default + Send,
        R: Send,
        F: FnMut(&mut V) -> Result<R, AppError> + Send,
    {
        let _guard = self.lock(key).await;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut value, version) = match self.get_versioned::<V>(key).await? {
                Some(stored) => (stored.value, stored.version),
                None => (V::default(), 0),
            };

            let result = apply(&mut value)?;

            if self.compare_and_set(key, &value, version).await? {
                return Ok(result);
            }

            tracing::warn!(key, attempt, "Concurrent write detected, retrying");
        }

        Err(AppError::Database(format!(
            "Gave up writing {} after {} attempts",
            key, MAX_WRITE_ATTEMPTS
        )))
    }
}
