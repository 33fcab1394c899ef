/// Fire-and-forget access logging for the public read API
///
/// Each successful read dispatches one insert as a detached task. The request
/// path never awaits it, and a failed insert is only reported to the log.

use crate::project::{types::AccessLogEntry, AccessLogStorage};
use axum::http::HeaderMap;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct AccessLogger {
    storage: AccessLogStorage,
}

impl AccessLogger {
    pub fn new(storage: AccessLogStorage) -> Self {
        Self { storage }
    }

    /// Dispatch the insert; the returned handle may be dropped
    pub fn record(&self, entry: AccessLogEntry) -> JoinHandle<()> {
        let storage = self.storage.clone();
        tokio::spawn(async move {
            match storage.insert(&entry).await {
                Ok(()) => tracing::debug!("📝 Logged access to {} for project {}", entry.endpoint, entry.project_id),
                Err(e) => tracing::warn!("⚠️ Failed to log API access to {}: {}", entry.endpoint, e),
            }
        })
    }
}

impl AccessLogEntry {
    /// Build an entry from the inbound request headers
    pub fn from_headers(project_id: impl Into<String>, endpoint: impl Into<String>, headers: &HeaderMap) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: endpoint.into(),
            ip_address: caller_ip(headers),
            user_agent: header_value(headers, "user-agent"),
        }
    }
}

/// Caller IP: first hop of X-Forwarded-For, else X-Real-IP, else none
pub fn caller_ip(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-forwarded-for")
        .and_then(|forwarded| {
            forwarded
                .split(',')
                .map(str::trim)
                .find(|hop| !hop.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_value(headers, "x-real-ip"))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(caller_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(caller_ip(&headers).as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn missing_headers_yield_no_ip() {
        let entry = AccessLogEntry::from_headers("p1", "/projects/abc/variables", &HeaderMap::new());
        assert_eq!(entry.ip_address, None);
        assert_eq!(entry.user_agent, None);
    }
}
