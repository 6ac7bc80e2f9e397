//! Read cache for offline fallback.
//!
//! This module provides the read side of offline support:
//! - Stores the last successful response body per fully-qualified URL
//! - Replaces entries whole; nothing expires or is deleted here
//! - Serves stored bodies when a read is attempted while disconnected

mod layer;
mod storage;
mod traits;

pub use layer::ReadCache;
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::{CacheKey, CachedResponse};
