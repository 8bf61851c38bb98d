//! Inbound fetch contract for the exposition text.
//!
//! The scheduler only depends on [`MetricsSource`]. [`HttpMetricsSource`] is
//! the production implementation that GETs the text from the backend that
//! fronts the instrumented process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::FetchError;

/// Placeholder replaced by the target id in URL templates.
pub const TARGET_PLACEHOLDER: &str = "{id}";

/// Opaque identity of a monitored process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fetches the raw exposition text of a target.
///
/// Any failure, transport or status, counts as "fetch failed this cycle".
#[async_trait]
pub trait MetricsSource: Send + Sync + 'static {
    async fn fetch(&self, target: &TargetId) -> Result<String, FetchError>;
}

/// HTTP source built from a URL template such as
/// `http://127.0.0.1:8080/api/processes/{id}/metrics`.
pub struct HttpMetricsSource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpMetricsSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Error creating HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    /// Renders the URL for a target. The `{id}` placeholder must be a whole
    /// path segment; the id is pushed through the url crate's segment encoder.
    pub fn url_for(&self, target: &TargetId) -> Result<reqwest::Url, FetchError> {
        let invalid = |reason: &str| FetchError::InvalidUrl {
            url: self.url_template.clone(),
            reason: reason.to_string(),
        };

        let (prefix, suffix) = self
            .url_template
            .split_once(TARGET_PLACEHOLDER)
            .ok_or_else(|| invalid("missing {id} placeholder"))?;
        if !prefix.ends_with('/') || !(suffix.is_empty() || suffix.starts_with(['/', '?'])) {
            return Err(invalid("{id} must be a whole path segment"));
        }
        let (suffix_path, query) = match suffix.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (suffix, None),
        };

        let mut url = reqwest::Url::parse(prefix).map_err(|e| invalid(&e.to_string()))?;
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| invalid("cannot be a base URL"))?;
            segs.pop_if_empty().push(target.as_str());
            segs.extend(suffix_path.split('/').filter(|seg| !seg.is_empty()));
        }
        url.set_query(query);
        Ok(url)
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    #[instrument(skip(self, target), fields(id = %target))]
    async fn fetch(&self, target: &TargetId) -> Result<String, FetchError> {
        let url = self.url_for(target)?;
        debug!("Fetching metrics from {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
            } else {
                text
            };
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_target() {
        let source = HttpMetricsSource::new(
            "http://127.0.0.1:8080/api/processes/{id}/metrics",
            Duration::from_secs(1),
        )
        .unwrap();
        let url = source.url_for(&TargetId::new("a1b2-c3")).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/processes/a1b2-c3/metrics");
    }

    #[test]
    fn test_url_escapes_target() {
        let source =
            HttpMetricsSource::new("http://localhost/p/{id}/metrics", Duration::from_secs(1)).unwrap();
        let url = source.url_for(&TargetId::new("a b/c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost/p/a%20b%2Fc/metrics");
    }

    #[test]
    fn test_invalid_template() {
        let source = HttpMetricsSource::new("not a url {id}", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            source.url_for(&TargetId::new("x")),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_url_keeps_suffix_and_query() {
        let source = HttpMetricsSource::new(
            "http://localhost/p/{id}/metrics?format=text",
            Duration::from_secs(1),
        )
        .unwrap();
        let url = source.url_for(&TargetId::new("7")).unwrap();
        assert_eq!(url.as_str(), "http://localhost/p/7/metrics?format=text");
    }

    #[test]
    fn test_placeholder_inside_segment_is_rejected() {
        let source =
            HttpMetricsSource::new("http://localhost/p/pid-{id}", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            source.url_for(&TargetId::new("7")),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_status_error_message_is_body() {
        let err = FetchError::Status {
            status: 404,
            message: "Process not found".into(),
        };
        assert_eq!(err.to_string(), "Process not found");
    }
}
