pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

/// Shared SQLite connection backing the queue and the read cache.
///
/// Clones share one connection; every caller goes through [`Database::with_conn`]
/// so each whole-collection read or write happens under a single lock.
#[derive(Clone)]
pub struct Database {
  conn: Arc<Mutex<Connection>>,
}

impl Database {
  /// Open or create the database at the given path.
  pub fn open(path: &Path) -> Result<Self, StorageError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StorageError::Unavailable(format!("Failed to create database directory: {}", e))
      })?;
    }

    let conn = Connection::open(path)?;
    Self::from_connection(conn)
  }

  /// Open a private in-memory database.
  pub fn open_in_memory() -> Result<Self, StorageError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StorageError> {
    let db = Self {
      conn: Arc::new(Mutex::new(conn)),
    };
    db.run_migrations()?;
    Ok(db)
  }

  /// Get the default database path
  pub fn default_path() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StorageError::Unavailable("Could not determine data directory".into()))?;

    Ok(data_dir.join("alert-relay").join("offline.db"))
  }

  /// Run database migrations
  fn run_migrations(&self) -> Result<(), StorageError> {
    self.with_conn(|conn| {
      conn.execute_batch(schema::SCHEMA)?;
      Ok(())
    })
  }

  /// Run `f` with exclusive access to the connection.
  pub fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
  where
    F: FnOnce(&mut Connection) -> Result<T, StorageError>,
  {
    let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
    f(&mut conn)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_create_tables() {
    let db = Database::open_in_memory().unwrap();
    let count: i64 = db
      .with_conn(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
           AND name IN ('kv_store', 'response_cache')",
          [],
          |row| row.get(0),
        )?)
      })
      .unwrap();
    assert_eq!(count, 2);
  }

  #[test]
  fn test_open_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("offline.db");
    Database::open(&path).unwrap();
    assert!(path.exists());
  }
}
