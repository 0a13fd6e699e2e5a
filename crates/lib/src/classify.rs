//! Failure rendering: one actionable chat line per [`DispatchError`].

use crate::error::DispatchError;

/// Prefix of every failure line.
pub const CONNECTION_ERROR_PREFIX: &str = "⚠️ Connection error! ";

/// reqwest's message for a request that failed before any response (connect, DNS, TLS, offline).
const TRANSPORT_FAILURE_SIGNATURE: &str = "error sending request";

/// Maps dispatch failures to display text. Holds the configured endpoint so the
/// troubleshooting hints can name it.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    target: String,
}

impl ErrorClassifier {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Display text for a failure. Never fails.
    pub fn classify(&self, err: &DispatchError) -> String {
        let detail = match err {
            DispatchError::Timeout => {
                "Request timed out. Is your server running? It may be unreachable or too slow to answer."
                    .to_string()
            }
            DispatchError::NetworkFailure(detail) if is_transport_failure(detail) => {
                self.troubleshooting()
            }
            DispatchError::NetworkFailure(detail) if detail.trim().is_empty() => {
                "The request could not be sent.".to_string()
            }
            DispatchError::NetworkFailure(detail) => detail.clone(),
            DispatchError::ServerStatus(code) => format!("Server error: {}", code),
            DispatchError::MalformedBody => {
                "Could not parse the server reply (expected JSON).".to_string()
            }
        };
        format!("{}{}", CONNECTION_ERROR_PREFIX, detail)
    }

    fn troubleshooting(&self) -> String {
        format!(
            "\n\nTroubleshooting:\n\
             1. Check if the backend service is running\n\
             2. Verify the backend address is correct: {}\n\
             3. Make sure you're on the same network as the backend\n\
             4. Try 10.0.2.2 from an Android emulator, or 127.0.0.1 if the backend runs on this machine",
            self.target
        )
    }
}

fn is_transport_failure(detail: &str) -> bool {
    detail.contains(TRANSPORT_FAILURE_SIGNATURE)
}
