//! Connectivity probe: `GET {root}` and expect `{"status": ..., "message": ...}`.
//!
//! Used for manual diagnostics only; it never touches a conversation session.

use serde::Deserialize;
use std::time::Duration;

use crate::config::BackendConfig;

/// Health reply of the mail-search service root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no reply within {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("backend answered with status {0}")]
    Status(u16),
}

/// Fetch the service root within `timeout`.
pub async fn probe(
    client: &reqwest::Client,
    root_url: &str,
    timeout: Duration,
) -> Result<ProbeStatus, ProbeError> {
    log::debug!("probe: GET {}", root_url);
    tokio::time::timeout(timeout, fetch_status(client, root_url))
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
}

/// Probe the configured backend root with a fresh client.
pub async fn probe_backend(backend: &BackendConfig) -> Result<ProbeStatus, ProbeError> {
    probe(&reqwest::Client::new(), &backend.probe_url(), backend.timeout()).await
}

async fn fetch_status(client: &reqwest::Client, root_url: &str) -> Result<ProbeStatus, ProbeError> {
    let res = client.get(root_url).send().await?;
    if !res.status().is_success() {
        return Err(ProbeError::Status(res.status().as_u16()));
    }
    Ok(res.json().await?)
}

/// Human-readable probe result, as shown by `inbox-chat probe` and `/probe`.
pub fn render_probe_report(root_url: &str, result: &Result<ProbeStatus, ProbeError>) -> String {
    match result {
        Ok(s) => format!(
            "✅ Backend is reachable!\n\nStatus: {}\nMessage: {}",
            s.status, s.message
        ),
        Err(e) => format!(
            "❌ Cannot reach backend at:\n{}\n\nError: {}\n\nMake sure:\n\
             1. Backend is running\n\
             2. The backend address is correct\n\
             3. You're on the same network",
            root_url, e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_for_reachable_backend() {
        let ok = Ok(ProbeStatus {
            status: "running".to_string(),
            message: "Backend is running!".to_string(),
        });
        assert_eq!(
            render_probe_report("http://127.0.0.1:5000", &ok),
            "✅ Backend is reachable!\n\nStatus: running\nMessage: Backend is running!"
        );
    }

    #[test]
    fn report_for_unreachable_backend() {
        let err = Err(ProbeError::Timeout(Duration::from_millis(1500)));
        let text = render_probe_report("http://10.0.2.2:5000", &err);
        assert!(text.starts_with("❌ Cannot reach backend at:\nhttp://10.0.2.2:5000"));
        assert!(text.contains("Error: no reply within 1500ms"));
        assert!(text.contains("1. Backend is running"));
    }

    #[test]
    fn probe_status_tolerates_extra_and_missing_fields() {
        let s: ProbeStatus = serde_json::from_str(
            r#"{"status":"running","endpoints":["/","/chat"]}"#,
        )
        .unwrap();
        assert_eq!(s.status, "running");
        assert_eq!(s.message, "");
    }
}
