//! Outbound request abstraction.
//!
//! The subsystem only needs "send this method/body to this URL and give me the
//! JSON back". [`Transport`] is that seam; [`HttpTransport`] is the reqwest
//! implementation and tests plug in scripted transports.

use futures::future::BoxFuture;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::NetworkError;

/// HTTP-like request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Patch,
  Delete,
}

impl Method {
  /// Reads are served from cache while offline. Only GET bodies populate it.
  pub fn is_read(self) -> bool {
    matches!(self, Method::Get | Method::Head)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Head => "HEAD",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Patch => "PATCH",
      Method::Delete => "DELETE",
    }
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Method {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "GET" => Ok(Method::Get),
      "HEAD" => Ok(Method::Head),
      "POST" => Ok(Method::Post),
      "PUT" => Ok(Method::Put),
      "PATCH" => Ok(Method::Patch),
      "DELETE" => Ok(Method::Delete),
      other => Err(format!("unsupported method '{}'", other)),
    }
  }
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Head => reqwest::Method::HEAD,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Patch => reqwest::Method::PATCH,
      Method::Delete => reqwest::Method::DELETE,
    }
  }
}

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
  pub url: Url,
  pub method: Method,
  pub body: Option<Value>,
}

/// A server response with its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
  pub status: u16,
  /// `Value::Null` when the server sent no body
  pub body: Value,
}

impl Response {
  pub fn ok(body: Value) -> Self {
    Self { status: 200, body }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Capability to issue an outbound request.
pub trait Transport: Send + Sync {
  /// Send the request and wait for the response or a transport failure.
  fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<Response, NetworkError>>;
}

/// Join an endpoint path onto the API base URL.
///
/// The endpoint is appended to the base as-is, so a base with a path prefix
/// (`http://host/api`) keeps it.
pub fn resolve_url(base: &Url, endpoint: &str) -> Result<Url, NetworkError> {
  let base = base.as_str().trim_end_matches('/');
  let full = if endpoint.starts_with('/') {
    format!("{}{}", base, endpoint)
  } else {
    format!("{}/{}", base, endpoint)
  };

  Url::parse(&full).map_err(|e| NetworkError::InvalidEndpoint {
    endpoint: endpoint.to_string(),
    reason: e.to_string(),
  })
}

/// Transport backed by a reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| NetworkError::ClientBuild(e.to_string()))?;

    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<Response, NetworkError>> {
    Box::pin(async move {
      let url = request.url.to_string();

      let mut builder = self
        .client
        .request(request.method.into(), request.url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

      if let Some(body) = &request.body {
        let data = serde_json::to_vec(body).map_err(|e| NetworkError::RequestFailed {
          url: url.clone(),
          reason: format!("Failed to serialize body: {}", e),
        })?;
        builder = builder.body(data);
      }

      let response = builder
        .send()
        .await
        .map_err(|e| NetworkError::RequestFailed {
          url: url.clone(),
          reason: e.to_string(),
        })?;

      let status = response.status().as_u16();
      let bytes = response
        .bytes()
        .await
        .map_err(|e| NetworkError::RequestFailed {
          url: url.clone(),
          reason: e.to_string(),
        })?;

      let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
      } else {
        serde_json::from_slice(&bytes).map_err(|e| NetworkError::InvalidBody {
          url,
          reason: e.to_string(),
        })?
      };

      Ok(Response { status, body })
    })
  }
}
