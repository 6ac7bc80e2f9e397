//! Reachability probe standing in for platform connectivity signals.
//!
//! Native hosts have no browser-style online/offline events, so the probe
//! opens a TCP connection to the API host on an interval and reports the
//! result to the [`ConnectivityMonitor`].

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::connectivity::ConnectivityMonitor;

pub struct ConnectivityProbe {
  host: String,
  port: u16,
  timeout: Duration,
}

impl ConnectivityProbe {
  /// Probe the host and port of `base_url`. Returns None for URLs without a host.
  pub fn for_url(base_url: &Url, timeout: Duration) -> Option<Self> {
    Some(Self {
      host: base_url.host_str()?.to_string(),
      port: base_url.port_or_known_default()?,
      timeout,
    })
  }

  /// One reachability check.
  pub async fn check(&self) -> bool {
    let attempt = TcpStream::connect((self.host.as_str(), self.port));
    let reachable = matches!(tokio::time::timeout(self.timeout, attempt).await, Ok(Ok(_)));
    debug!(host = %self.host, port = self.port, reachable, "connectivity probe");
    reachable
  }

  /// Feed a check into `monitor` every `interval`, forever.
  pub async fn run(self, monitor: Arc<ConnectivityMonitor>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
      ticker.tick().await;
      monitor.set_connected(self.check().await);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::net::TcpListener;

  #[test]
  fn test_for_url_uses_default_port() {
    let probe =
      ConnectivityProbe::for_url(&Url::parse("https://example.org/api").unwrap(), Duration::from_secs(1))
        .unwrap();
    assert_eq!(probe.host, "example.org");
    assert_eq!(probe.port, 443);
  }

  #[tokio::test]
  async fn test_check_reachable_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();

    let probe = ConnectivityProbe::for_url(&url, Duration::from_secs(1)).unwrap();
    assert!(probe.check().await);
  }

  #[tokio::test]
  async fn test_check_closed_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();

    let probe = ConnectivityProbe::for_url(&url, Duration::from_secs(1)).unwrap();
    assert!(!probe.check().await);
  }
}
