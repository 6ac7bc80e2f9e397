//! Delivery of queued writes once connectivity returns.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::connectivity::{ConnectivityEvent, ConnectivityMonitor};
use crate::error::Result;
use crate::queue::{DurableQueue, QueuedRequest};
use crate::transport::{resolve_url, OutboundRequest, Transport};

/// What happens to the queue after a drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainPolicy {
  /// Clear the whole queue after the pass, dropping failed entries.
  #[default]
  ClearAll,
  /// Remove only delivered entries; failed ones wait for the next drain.
  RetainFailed,
}

impl DrainPolicy {
  pub fn from_retain_failed(retain_failed_entries: bool) -> Self {
    if retain_failed_entries {
      DrainPolicy::RetainFailed
    } else {
      DrainPolicy::ClearAll
    }
  }
}

/// A queued request that could not be delivered.
#[derive(Debug, Clone)]
pub struct FailedDelivery {
  pub request: QueuedRequest,
  pub reason: String,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
  /// Ids in the order they were attempted
  pub attempted: Vec<u64>,
  pub delivered: Vec<u64>,
  pub failed: Vec<FailedDelivery>,
  /// Entries left in the queue for the next drain
  pub retained: usize,
}

impl DrainReport {
  pub fn is_empty(&self) -> bool {
    self.attempted.is_empty()
  }
}

/// Drains the durable queue against the network.
#[derive(Clone)]
pub struct SyncCoordinator {
  queue: DurableQueue,
  transport: Arc<dyn Transport>,
  base_url: Url,
  policy: DrainPolicy,
}

impl SyncCoordinator {
  pub fn new(
    queue: DurableQueue,
    transport: Arc<dyn Transport>,
    base_url: Url,
    policy: DrainPolicy,
  ) -> Self {
    Self {
      queue,
      transport,
      base_url,
      policy,
    }
  }

  pub fn policy(&self) -> DrainPolicy {
    self.policy
  }

  /// Attempt every queued request once, oldest first.
  ///
  /// Individual failures are logged and reported but never stop the pass.
  /// Only a storage failure reading or updating the queue is returned as an error.
  pub async fn drain(&self) -> Result<DrainReport> {
    let snapshot = self.queue.drain_snapshot()?;
    if snapshot.is_empty() {
      debug!("drain skipped, queue is empty");
      return Ok(DrainReport::default());
    }

    info!(count = snapshot.len(), "draining offline queue");
    let mut report = DrainReport::default();

    for request in snapshot {
      report.attempted.push(request.id);
      match self.deliver(&request).await {
        Ok(()) => report.delivered.push(request.id),
        Err(reason) => {
          warn!(
            id = request.id,
            endpoint = %request.endpoint,
            %reason,
            "failed to sync offline request"
          );
          report.failed.push(FailedDelivery { request, reason });
        }
      }
    }

    match self.policy {
      DrainPolicy::ClearAll => {
        self.queue.clear()?;
        report.retained = 0;
      }
      DrainPolicy::RetainFailed => {
        self.queue.remove(&report.delivered)?;
        report.retained = self.queue.len()?;
      }
    }

    info!(
      delivered = report.delivered.len(),
      failed = report.failed.len(),
      retained = report.retained,
      "drain finished"
    );
    Ok(report)
  }

  async fn deliver(&self, request: &QueuedRequest) -> std::result::Result<(), String> {
    let url = resolve_url(&self.base_url, &request.endpoint).map_err(|e| e.to_string())?;
    let response = self
      .transport
      .send(OutboundRequest {
        url,
        method: request.method,
        body: request.body.clone(),
      })
      .await
      .map_err(|e| e.to_string())?;

    if response.is_success() {
      Ok(())
    } else {
      Err(format!("server responded with status {}", response.status))
    }
  }

  /// Drain once per `Connected` event until the monitor goes away.
  ///
  /// Each drain completes before the next event is looked at.
  pub async fn run(self, mut events: mpsc::UnboundedReceiver<ConnectivityEvent>) {
    while let Some(event) = events.recv().await {
      if event != ConnectivityEvent::Connected {
        continue;
      }
      if let Err(e) = self.drain().await {
        error!(error = %e, "offline queue drain failed");
      }
    }
  }

  /// Subscribe to `monitor` and run on a background task.
  pub fn spawn(self, monitor: &ConnectivityMonitor) -> JoinHandle<()> {
    let events = monitor.subscribe();
    tokio::spawn(self.run(events))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::queue::QueuedRequest;
  use crate::test_support::{memory_stores, queued, FailingQueueStorage, MockTransport, BASE_URL};
  use crate::transport::Response;
  use serde_json::json;

  fn coordinator(queue: DurableQueue, transport: &MockTransport, policy: DrainPolicy) -> SyncCoordinator {
    SyncCoordinator::new(
      queue,
      Arc::new(transport.clone()),
      Url::parse(BASE_URL).unwrap(),
      policy,
    )
  }

  #[tokio::test]
  async fn test_failed_entry_is_dropped() {
    let (queue, _) = memory_stores();
    queue.enqueue(queued("/accidents/a", json!({"t": 0}))).unwrap();
    queue.enqueue(queued("/accidents/b", json!({"t": 1}))).unwrap();

    let transport = MockTransport::new();
    transport.fail("/accidents/b");

    let report = coordinator(queue.clone(), &transport, DrainPolicy::ClearAll)
      .drain()
      .await
      .unwrap();

    assert_eq!(report.delivered, vec![1]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].request.endpoint, "/accidents/b");
    assert!(queue.is_empty().unwrap());
    assert_eq!(transport.called_paths(), vec!["/accidents/a", "/accidents/b"]);
  }

  #[tokio::test]
  async fn test_partial_failures_still_empty_queue_in_order() {
    let (queue, _) = memory_stores();
    for i in 0..6 {
      queue.enqueue(queued(&format!("/emergency/{}", i), json!(i))).unwrap();
    }

    let transport = MockTransport::new();
    transport.fail("/emergency/1");
    transport.respond(
      "/emergency/4",
      Response {
        status: 500,
        body: json!({"detail": "boom"}),
      },
    );

    let report = coordinator(queue.clone(), &transport, DrainPolicy::ClearAll)
      .drain()
      .await
      .unwrap();

    let expected: Vec<String> = (0..6).map(|i| format!("/emergency/{}", i)).collect();
    assert_eq!(transport.called_paths(), expected);
    assert_eq!(report.attempted, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.retained, 0);
    assert!(queue.is_empty().unwrap());
  }

  #[tokio::test]
  async fn test_retain_failed_keeps_only_failures() {
    let (queue, _) = memory_stores();
    queue.enqueue(queued("/accidents/a", json!(1))).unwrap();
    queue.enqueue(queued("/accidents/b", json!(2))).unwrap();
    queue.enqueue(queued("/accidents/c", json!(3))).unwrap();

    let transport = MockTransport::new();
    transport.fail("/accidents/b");

    let report = coordinator(queue.clone(), &transport, DrainPolicy::RetainFailed)
      .drain()
      .await
      .unwrap();

    assert_eq!(report.retained, 1);
    let remaining = queue.drain_snapshot().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].endpoint, "/accidents/b");
  }

  #[tokio::test]
  async fn test_drain_sends_method_and_body() {
    let (queue, _) = memory_stores();
    queue
      .enqueue(QueuedRequest::new(
        "/emergency/update",
        Some(crate::transport::Method::Put),
        Some(json!({"status": "resolved"})),
      ))
      .unwrap();

    let transport = MockTransport::new();
    coordinator(queue, &transport, DrainPolicy::ClearAll)
      .drain()
      .await
      .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url.as_str(), "http://127.0.0.1:8000/emergency/update");
    assert_eq!(calls[0].method, crate::transport::Method::Put);
    assert_eq!(calls[0].body, Some(json!({"status": "resolved"})));
  }

  #[tokio::test]
  async fn test_drain_empty_queue_twice_is_noop() {
    let (queue, _) = memory_stores();
    let transport = MockTransport::new();
    let coordinator = coordinator(queue, &transport, DrainPolicy::ClearAll);

    assert!(coordinator.drain().await.unwrap().is_empty());
    assert!(coordinator.drain().await.unwrap().is_empty());
    assert!(transport.calls().is_empty());
  }

  #[tokio::test]
  async fn test_drain_storage_failure_is_error() {
    let queue = DurableQueue::new(FailingQueueStorage);
    let transport = MockTransport::new();

    let result = coordinator(queue, &transport, DrainPolicy::ClearAll).drain().await;
    assert!(matches!(result, Err(crate::error::Error::Storage(_))));
    assert!(transport.calls().is_empty());
  }

  #[tokio::test]
  async fn test_run_drains_once_per_connected_transition() {
    let (queue, _) = memory_stores();
    let transport = MockTransport::new();
    let monitor = ConnectivityMonitor::new(false);
    let events = monitor.subscribe();

    queue.enqueue(queued("/accidents/a", json!(1))).unwrap();
    monitor.became_connected();
    monitor.became_connected();
    monitor.became_disconnected();
    queue.enqueue(queued("/accidents/b", json!(2))).unwrap();
    monitor.became_connected();
    drop(monitor);

    // Both transitions were dispatched before the loop ran, so both drains
    // see the whole queue: the first delivers a and b, the second finds it empty.
    coordinator(queue.clone(), &transport, DrainPolicy::ClearAll)
      .run(events)
      .await;

    assert_eq!(transport.called_paths(), vec!["/accidents/a", "/accidents/b"]);
    assert!(queue.is_empty().unwrap());
  }

  #[test]
  fn test_policy_from_flag() {
    assert_eq!(DrainPolicy::from_retain_failed(false), DrainPolicy::ClearAll);
    assert_eq!(DrainPolicy::from_retain_failed(true), DrainPolicy::RetainFailed);
  }
}
