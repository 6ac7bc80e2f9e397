//! Core types for the read cache.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Identity of a read request: the fully-qualified URL (scheme, host, path, query).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
  /// Build a key from a resolved request URL.
  pub fn from_url(url: &Url) -> Self {
    Self(url.as_str().to_string())
  }

  /// The URL this key stands for.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// SHA256 of the URL, used as the stable storage key.
  pub fn storage_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.0.as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A stored read response.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
  /// The response body as last seen
  pub payload: Value,
  /// When it was stored
  pub cached_at: DateTime<Utc>,
}
