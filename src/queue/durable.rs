use std::sync::Arc;
use tracing::info;

use super::storage::QueueStorage;
use super::types::QueuedRequest;
use crate::error::StorageError;

/// Ordered, persisted list of writes that could not be delivered.
///
/// Insertion order is delivery order. The queue is the single source of truth
/// for pending writes; nothing on the read path consults it.
#[derive(Clone)]
pub struct DurableQueue {
  storage: Arc<dyn QueueStorage>,
}

impl DurableQueue {
  /// Create a queue over the given storage backend.
  pub fn new(storage: impl QueueStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Append a request to the end of the queue.
  ///
  /// On a storage failure the request is lost; there is no secondary store.
  pub fn enqueue(&self, request: QueuedRequest) -> Result<QueuedRequest, StorageError> {
    let stored = self.storage.append(request)?;
    info!(
      id = stored.id,
      endpoint = %stored.endpoint,
      method = %stored.method,
      "queued request for later delivery"
    );
    Ok(stored)
  }

  /// Current contents in insertion order, without removing them.
  pub fn drain_snapshot(&self) -> Result<Vec<QueuedRequest>, StorageError> {
    self.storage.load()
  }

  /// Remove the given entries.
  pub fn remove(&self, ids: &[u64]) -> Result<(), StorageError> {
    self.storage.remove(ids)
  }

  /// Empty the queue unconditionally.
  pub fn clear(&self) -> Result<(), StorageError> {
    self.storage.clear()
  }

  pub fn len(&self) -> Result<usize, StorageError> {
    Ok(self.storage.load()?.len())
  }

  pub fn is_empty(&self) -> Result<bool, StorageError> {
    Ok(self.len()? == 0)
  }
}
