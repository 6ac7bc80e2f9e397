//! Offline-first request delivery.
//!
//! Callers issue every request through [`RequestGateway`]. While connected it
//! talks to the network and remembers successful reads; while disconnected it
//! serves reads from the [`ReadCache`], queues emergency-class writes in the
//! [`DurableQueue`] and rejects everything else with [`Error::Offline`]. The
//! [`SyncCoordinator`] drains the queue each time the [`ConnectivityMonitor`]
//! reports a transition back to connected.

pub mod cache;
pub mod classify;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod gateway;
pub mod probe;
pub mod queue;
pub mod sync;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cache::ReadCache;
pub use classify::{KeywordClassifier, RequestClassifier};
pub use client::OfflineClient;
pub use config::Config;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use error::{Error, NetworkError, Result, StorageError};
pub use gateway::{ApiRequest, Outcome, RequestGateway};
pub use queue::{DurableQueue, Priority, QueuedRequest};
pub use sync::{DrainPolicy, DrainReport, SyncCoordinator};
pub use transport::{HttpTransport, Method, Transport};
