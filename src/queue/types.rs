use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::Method;

/// Delivery priority of a queued write.
///
/// Only `High` is produced today; `Normal` is reserved for differentiated handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  #[default]
  High,
  Normal,
}

/// A write that must eventually reach the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
  /// Assigned by the queue on append; unique within one queue
  #[serde(default)]
  pub id: u64,
  /// Logical resource path, e.g. "/accidents/report"
  pub endpoint: String,
  /// Missing in stored data means POST
  #[serde(default = "default_method")]
  pub method: Method,
  /// Serialized JSON body
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body: Option<Value>,
  pub enqueued_at: DateTime<Utc>,
  #[serde(default)]
  pub priority: Priority,
}

fn default_method() -> Method {
  Method::Post
}

impl QueuedRequest {
  /// Create a high-priority request stamped with the current time.
  ///
  /// `method` falls back to POST when not given.
  pub fn new(endpoint: impl Into<String>, method: Option<Method>, body: Option<Value>) -> Self {
    Self {
      id: 0,
      endpoint: endpoint.into(),
      method: method.unwrap_or_else(default_method),
      body,
      enqueued_at: Utc::now(),
      priority: Priority::High,
    }
  }
}

/// On-disk shape of the queue: the whole sequence plus the id counter.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct PersistedQueue {
  #[serde(default)]
  pub next_id: u64,
  #[serde(default)]
  pub requests: Vec<QueuedRequest>,
}
