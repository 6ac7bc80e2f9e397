//! Read-through cache used as the offline fallback for reads.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::storage::CacheStorage;
use super::traits::{CacheKey, CachedResponse};
use crate::error::StorageError;

/// Read cache over a storage backend.
///
/// Populated only by successful connected reads and consulted only when the
/// network is unavailable. Entries are replaced whole and never expire here.
#[derive(Clone)]
pub struct ReadCache {
  storage: Arc<dyn CacheStorage>,
}

impl ReadCache {
  /// Create a new read cache with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Store `payload` for `key`, overwriting any previous entry.
  pub fn put(&self, key: &CacheKey, payload: &Value) -> Result<(), StorageError> {
    self.storage.store(key, payload)?;
    debug!(key = %key, "cached read response");
    Ok(())
  }

  /// Get the payload stored for `key`.
  pub fn get(&self, key: &CacheKey) -> Result<Option<Value>, StorageError> {
    Ok(self.get_entry(key)?.map(|entry| entry.payload))
  }

  /// Get the payload together with when it was cached.
  pub fn get_entry(&self, key: &CacheKey) -> Result<Option<CachedResponse>, StorageError> {
    self.storage.load(key)
  }
}
