//! Shared helpers for unit tests.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::cache::{ReadCache, SqliteStorage as CacheSqlite};
use crate::db::Database;
use crate::error::{NetworkError, StorageError};
use crate::queue::{DurableQueue, QueueStorage, QueuedRequest, SqliteStorage as QueueSqlite};
use crate::transport::{OutboundRequest, Response, Transport};

pub const BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Default)]
struct MockState {
  responses: HashMap<String, Response>,
  failing: HashSet<String>,
  calls: Vec<OutboundRequest>,
}

/// Scripted transport keyed by URL path (plus query).
///
/// Unscripted paths answer 200 with `{"ok": true}`.
#[derive(Clone, Default)]
pub struct MockTransport {
  state: Arc<Mutex<MockState>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, path: &str, response: Response) {
    self.state.lock().unwrap().responses.insert(path.to_string(), response);
  }

  pub fn fail(&self, path: &str) {
    self.state.lock().unwrap().failing.insert(path.to_string());
  }

  pub fn calls(&self) -> Vec<OutboundRequest> {
    self.state.lock().unwrap().calls.clone()
  }

  /// Paths of recorded calls in order.
  pub fn called_paths(&self) -> Vec<String> {
    self.calls().iter().map(|c| path_of(c)).collect()
  }
}

fn path_of(request: &OutboundRequest) -> String {
  match request.url.query() {
    Some(q) => format!("{}?{}", request.url.path(), q),
    None => request.url.path().to_string(),
  }
}

impl Transport for MockTransport {
  fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<Response, NetworkError>> {
    Box::pin(async move {
      let mut state = self.state.lock().unwrap();
      let path = path_of(&request);
      let url = request.url.to_string();
      state.calls.push(request);

      if state.failing.contains(&path) {
        return Err(NetworkError::RequestFailed {
          url,
          reason: "connection refused".to_string(),
        });
      }

      Ok(
        state
          .responses
          .get(&path)
          .cloned()
          .unwrap_or_else(|| Response::ok(serde_json::json!({"ok": true}))),
      )
    })
  }
}

/// Queue storage whose every operation fails.
pub struct FailingQueueStorage;

impl QueueStorage for FailingQueueStorage {
  fn append(&self, _request: QueuedRequest) -> Result<QueuedRequest, StorageError> {
    Err(StorageError::Unavailable("disk full".to_string()))
  }

  fn load(&self) -> Result<Vec<QueuedRequest>, StorageError> {
    Err(StorageError::Unavailable("disk full".to_string()))
  }

  fn remove(&self, _ids: &[u64]) -> Result<(), StorageError> {
    Err(StorageError::Unavailable("disk full".to_string()))
  }

  fn clear(&self) -> Result<(), StorageError> {
    Err(StorageError::Unavailable("disk full".to_string()))
  }
}

/// Queue and cache sharing one in-memory database.
pub fn memory_stores() -> (DurableQueue, ReadCache) {
  let db = Database::open_in_memory().unwrap();
  (
    DurableQueue::new(QueueSqlite::new(db.clone())),
    ReadCache::new(CacheSqlite::new(db)),
  )
}

pub fn queued(endpoint: &str, body: Value) -> QueuedRequest {
  QueuedRequest::new(endpoint, None, Some(body))
}
