//! Error types for the offline delivery subsystem.

/// Persistence layer failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  /// SQLite error.
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// Stored payload could not be (de)serialized.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Connection mutex was poisoned by a panicking holder.
  #[error("storage lock poisoned")]
  LockPoisoned,

  /// Database file or directory could not be prepared.
  #[error("{0}")]
  Unavailable(String),
}

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
  /// Endpoint could not be joined onto the base URL.
  #[error("invalid endpoint '{endpoint}': {reason}")]
  InvalidEndpoint { endpoint: String, reason: String },

  /// The HTTP client could not be constructed.
  #[error("failed to create HTTP client: {0}")]
  ClientBuild(String),

  /// The request never produced a response.
  #[error("request to {url} failed: {reason}")]
  RequestFailed { url: String, reason: String },

  /// The response body was not valid JSON.
  #[error("invalid response body from {url}: {reason}")]
  InvalidBody { url: String, reason: String },
}

/// Errors surfaced by the request gateway and the sync coordinator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// No connectivity and no applicable fallback.
  #[error("You are offline. Please check your connection.")]
  Offline,

  /// Persistence unavailable.
  #[error("storage failure: {0}")]
  Storage(#[from] StorageError),

  /// Network failure on the connected path.
  #[error(transparent)]
  Network(#[from] NetworkError),
}

/// Result type for subsystem operations.
pub type Result<T> = std::result::Result<T, Error>;
