//! Emergency-class request classification.

/// Decides whether an endpoint denotes a safety-critical write that may be
/// queued while offline.
pub trait RequestClassifier: Send + Sync {
  fn is_emergency(&self, endpoint: &str) -> bool;
}

impl<F> RequestClassifier for F
where
  F: Fn(&str) -> bool + Send + Sync,
{
  fn is_emergency(&self, endpoint: &str) -> bool {
    self(endpoint)
  }
}

/// Default keywords for emergency-class endpoints.
pub const DEFAULT_EMERGENCY_KEYWORDS: &[&str] = &["accident", "emergency"];

/// Matches endpoints containing any of a fixed set of keywords (case-sensitive).
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
  keywords: Vec<String>,
}

impl KeywordClassifier {
  pub fn new<I, S>(keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      keywords: keywords
        .into_iter()
        .map(Into::into)
        .filter(|k: &String| !k.is_empty())
        .collect(),
    }
  }

  pub fn keywords(&self) -> &[String] {
    &self.keywords
  }
}

impl Default for KeywordClassifier {
  fn default() -> Self {
    Self::new(DEFAULT_EMERGENCY_KEYWORDS.iter().copied())
  }
}

impl RequestClassifier for KeywordClassifier {
  fn is_emergency(&self, endpoint: &str) -> bool {
    self.keywords.iter().any(|k| endpoint.contains(k.as_str()))
  }
}
