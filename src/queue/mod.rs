//! Durable queue of writes made while offline.
//!
//! The whole queue is stored as a single JSON value in SQLite and rewritten
//! atomically on every change, so a crash never leaves a torn sequence.

mod durable;
mod storage;
mod types;

pub use durable::DurableQueue;
pub use storage::{QueueStorage, SqliteStorage, QUEUE_ENTRY_NAME};
pub use types::{Priority, QueuedRequest};
