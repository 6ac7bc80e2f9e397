//! Single entry point for issuing requests with offline fallback.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheKey, ReadCache};
use crate::classify::RequestClassifier;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::queue::{DurableQueue, QueuedRequest};
use crate::transport::{resolve_url, Method, OutboundRequest, Response, Transport};

/// A request as issued by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub endpoint: String,
  pub method: Method,
  pub body: Option<Value>,
}

impl ApiRequest {
  pub fn new(endpoint: impl Into<String>, method: Method, body: Option<Value>) -> Self {
    Self {
      endpoint: endpoint.into(),
      method,
      body,
    }
  }

  pub fn get(endpoint: impl Into<String>) -> Self {
    Self::new(endpoint, Method::Get, None)
  }

  pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
    Self::new(endpoint, Method::Post, Some(body))
  }
}

/// How a gateway call was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  /// The network answered
  Network(Response),
  /// Offline read served from the read cache
  Cached(Value),
  /// Offline emergency write accepted into the queue
  QueuedOffline {
    id: u64,
    /// Best-effort echo of whatever was cached for the same URL
    cached: Option<Value>,
  },
}

impl Outcome {
  pub fn is_offline(&self) -> bool {
    !matches!(self, Outcome::Network(_))
  }

  /// Status of a network response outside 2xx.
  pub fn failed_status(&self) -> Option<u16> {
    match self {
      Outcome::Network(response) if !response.is_success() => Some(response.status),
      _ => None,
    }
  }

  /// The response body, or the offline envelope for offline results.
  pub fn into_json(self) -> Value {
    match self {
      Outcome::Network(response) => response.body,
      Outcome::Cached(data) => json!({ "success": true, "offline": true, "data": data }),
      Outcome::QueuedOffline {
        cached: Some(data), ..
      } => json!({ "success": true, "offline": true, "data": data }),
      Outcome::QueuedOffline { cached: None, .. } => json!({
        "success": true,
        "offline": true,
        "message": "Emergency alert saved offline",
      }),
    }
  }
}

/// Routes each call to the network, the read cache or the durable queue.
#[derive(Clone)]
pub struct RequestGateway {
  base_url: Url,
  transport: Arc<dyn Transport>,
  monitor: Arc<ConnectivityMonitor>,
  queue: DurableQueue,
  cache: ReadCache,
  classifier: Arc<dyn RequestClassifier>,
}

impl RequestGateway {
  pub fn new(
    base_url: Url,
    transport: Arc<dyn Transport>,
    monitor: Arc<ConnectivityMonitor>,
    queue: DurableQueue,
    cache: ReadCache,
    classifier: Arc<dyn RequestClassifier>,
  ) -> Self {
    Self {
      base_url,
      transport,
      monitor,
      queue,
      cache,
      classifier,
    }
  }

  /// Issue a request, falling back to the cache or queue when disconnected.
  pub async fn request(&self, request: ApiRequest) -> Result<Outcome> {
    let url = resolve_url(&self.base_url, &request.endpoint)?;

    if self.monitor.is_connected() {
      self.online(url, request).await
    } else {
      self.offline(url, request)
    }
  }

  /// Shorthand for a GET.
  pub async fn get(&self, endpoint: &str) -> Result<Outcome> {
    self.request(ApiRequest::get(endpoint)).await
  }

  async fn online(&self, url: Url, request: ApiRequest) -> Result<Outcome> {
    debug!(method = %request.method, %url, "sending request");
    let response = self
      .transport
      .send(OutboundRequest {
        url: url.clone(),
        method: request.method,
        body: request.body,
      })
      .await?;

    // Cache successful GET responses; HEAD bodies are empty and would clobber them
    if request.method == Method::Get && response.is_success() {
      let key = CacheKey::from_url(&url);
      if let Err(e) = self.cache.put(&key, &response.body) {
        warn!(%key, error = %e, "failed to cache read response");
      }
    }

    Ok(Outcome::Network(response))
  }

  fn offline(&self, url: Url, request: ApiRequest) -> Result<Outcome> {
    let key = CacheKey::from_url(&url);

    if request.method.is_read() {
      debug!(%key, "offline read, consulting cache");
      return match self.cache.get(&key)? {
        Some(payload) => Ok(Outcome::Cached(payload)),
        None => Err(Error::Offline),
      };
    }

    if !self.classifier.is_emergency(&request.endpoint) {
      debug!(endpoint = %request.endpoint, "offline write rejected");
      return Err(Error::Offline);
    }

    let stored = self.queue.enqueue(QueuedRequest::new(
      request.endpoint,
      Some(request.method),
      request.body,
    ))?;

    // Try to get cached response
    let cached = match self.cache.get(&key) {
      Ok(cached) => cached,
      Err(e) => {
        warn!(%key, error = %e, "cache access error");
        None
      }
    };

    Ok(Outcome::QueuedOffline {
      id: stored.id,
      cached,
    })
  }

  pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
    &self.monitor
  }

  pub fn queue(&self) -> &DurableQueue {
    &self.queue
  }

  pub fn cache(&self) -> &ReadCache {
    &self.cache
  }
}
