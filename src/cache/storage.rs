//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::traits::{CacheKey, CachedResponse};
use crate::db::Database;
use crate::error::StorageError;

/// Trait for read cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Store a payload, replacing whatever was there for `key`.
  fn store(&self, key: &CacheKey, payload: &Value) -> Result<(), StorageError>;

  /// Get the stored payload for `key`.
  fn load(&self, key: &CacheKey) -> Result<Option<CachedResponse>, StorageError>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store(&self, _key: &CacheKey, _payload: &Value) -> Result<(), StorageError> {
    Ok(()) // Discard
  }

  fn load(&self, _key: &CacheKey) -> Result<Option<CachedResponse>, StorageError> {
    Ok(None) // Always miss
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  db: Database,
}

impl SqliteStorage {
  pub fn new(db: Database) -> Self {
    Self { db }
  }
}

impl CacheStorage for SqliteStorage {
  fn store(&self, key: &CacheKey, payload: &Value) -> Result<(), StorageError> {
    let data = serde_json::to_vec(payload)?;

    self.db.with_conn(|conn| {
      conn.execute(
        "INSERT OR REPLACE INTO response_cache (url_hash, url, payload, cached_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![key.storage_hash(), key.as_str(), data],
      )?;
      Ok(())
    })
  }

  fn load(&self, key: &CacheKey) -> Result<Option<CachedResponse>, StorageError> {
    let row: Option<(Vec<u8>, String)> = self.db.with_conn(|conn| {
      Ok(
        conn
          .query_row(
            "SELECT payload, cached_at FROM response_cache WHERE url_hash = ?",
            params![key.storage_hash()],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?,
      )
    })?;

    match row {
      Some((data, cached_at_str)) => Ok(Some(CachedResponse {
        payload: serde_json::from_slice(&data)?,
        cached_at: parse_datetime(&cached_at_str)?,
      })),
      None => Ok(None),
    }
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| StorageError::Unavailable(format!("Failed to parse datetime '{}': {}", s, e)))
}
