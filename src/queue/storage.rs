//! Queue storage trait and SQLite implementation.

use rusqlite::{params, OptionalExtension, Transaction};

use super::types::{PersistedQueue, QueuedRequest};
use crate::db::Database;
use crate::error::StorageError;

/// Name of the row holding the serialized queue.
pub const QUEUE_ENTRY_NAME: &str = "offline_requests";

/// Trait for queue storage backends.
///
/// The queue is persisted as one unit: every operation reads and/or rewrites
/// the whole sequence atomically.
pub trait QueueStorage: Send + Sync {
  /// Append a request, assigning its id. Returns the stored request.
  fn append(&self, request: QueuedRequest) -> Result<QueuedRequest, StorageError>;

  /// All stored requests in insertion order.
  fn load(&self) -> Result<Vec<QueuedRequest>, StorageError>;

  /// Remove the requests with the given ids, keeping the order of the rest.
  fn remove(&self, ids: &[u64]) -> Result<(), StorageError>;

  /// Remove everything.
  fn clear(&self) -> Result<(), StorageError>;
}

/// SQLite-based queue storage implementation.
pub struct SqliteStorage {
  db: Database,
}

impl SqliteStorage {
  pub fn new(db: Database) -> Self {
    Self { db }
  }
}

fn read_queue(tx: &Transaction<'_>) -> Result<PersistedQueue, StorageError> {
  let data: Option<Vec<u8>> = tx
    .query_row(
      "SELECT value FROM kv_store WHERE name = ?",
      params![QUEUE_ENTRY_NAME],
      |row| row.get(0),
    )
    .optional()?;

  match data {
    Some(data) => Ok(serde_json::from_slice(&data)?),
    None => Ok(PersistedQueue::default()),
  }
}

fn write_queue(tx: &Transaction<'_>, queue: &PersistedQueue) -> Result<(), StorageError> {
  let data = serde_json::to_vec(queue)?;
  tx.execute(
    "INSERT OR REPLACE INTO kv_store (name, value, updated_at)
     VALUES (?, ?, datetime('now'))",
    params![QUEUE_ENTRY_NAME, data],
  )?;
  Ok(())
}

impl QueueStorage for SqliteStorage {
  fn append(&self, mut request: QueuedRequest) -> Result<QueuedRequest, StorageError> {
    self.db.with_conn(|conn| {
      let tx = conn.transaction()?;
      let mut queue = read_queue(&tx)?;

      queue.next_id += 1;
      request.id = queue.next_id;
      queue.requests.push(request.clone());

      write_queue(&tx, &queue)?;
      tx.commit()?;
      Ok(request)
    })
  }

  fn load(&self) -> Result<Vec<QueuedRequest>, StorageError> {
    self.db.with_conn(|conn| {
      let tx = conn.transaction()?;
      let queue = read_queue(&tx)?;
      tx.commit()?;
      Ok(queue.requests)
    })
  }

  fn remove(&self, ids: &[u64]) -> Result<(), StorageError> {
    if ids.is_empty() {
      return Ok(());
    }

    self.db.with_conn(|conn| {
      let tx = conn.transaction()?;
      let mut queue = read_queue(&tx)?;
      queue.requests.retain(|r| !ids.contains(&r.id));
      write_queue(&tx, &queue)?;
      tx.commit()?;
      Ok(())
    })
  }

  fn clear(&self) -> Result<(), StorageError> {
    // Keep the id counter so ids stay unique across drains
    self.db.with_conn(|conn| {
      let tx = conn.transaction()?;
      let mut queue = read_queue(&tx)?;
      queue.requests.clear();
      write_queue(&tx, &queue)?;
      tx.commit()?;
      Ok(())
    })
  }
}
