use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::info;

/// Connectivity transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
  /// Platform reported the network path is back
  Connected,
  /// Platform reported the network path is gone
  Disconnected,
}

/// Tracks the platform-reported connectivity state and notifies listeners of transitions.
///
/// The state is whatever the platform last said; it is never verified with a round trip.
pub struct ConnectivityMonitor {
  connected: AtomicBool,
  listeners: Mutex<Vec<mpsc::UnboundedSender<ConnectivityEvent>>>,
}

impl ConnectivityMonitor {
  /// Create a monitor seeded with the platform's current state.
  pub fn new(initially_connected: bool) -> Self {
    Self {
      connected: AtomicBool::new(initially_connected),
      listeners: Mutex::new(Vec::new()),
    }
  }

  /// Last known platform-reported state.
  pub fn is_connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }

  /// Register a listener. Events are delivered in registration order.
  pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConnectivityEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.lock_listeners().push(tx);
    rx
  }

  /// Platform signal: the network became reachable.
  pub fn became_connected(&self) {
    self.set_connected(true);
  }

  /// Platform signal: the network became unreachable.
  pub fn became_disconnected(&self) {
    self.set_connected(false);
  }

  /// Record the platform state. Returns true if this was a transition.
  pub fn set_connected(&self, connected: bool) -> bool {
    // Hold the listener lock across the swap so concurrent signals dispatch in order
    let mut listeners = self.lock_listeners();

    let previous = self.connected.swap(connected, Ordering::SeqCst);
    if previous == connected {
      return false;
    }

    let event = if connected {
      ConnectivityEvent::Connected
    } else {
      ConnectivityEvent::Disconnected
    };
    info!(?event, "connectivity changed");

    listeners.retain(|tx| tx.send(event).is_ok());
    true
  }

  fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<ConnectivityEvent>>> {
    // A poisoned list is still a valid list of senders
    self
      .listeners
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
