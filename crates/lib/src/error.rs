//! Failures of one round trip, as seen by the conversation session.
//!
//! Every transport fault is folded into a [`DispatchError`] inside the dispatcher;
//! nothing below the transport boundary escapes as a raw `reqwest::Error`.

/// Why a request did not produce a decoded reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The deadline elapsed before the reply arrived; the call was aborted.
    #[error("request timed out")]
    Timeout,
    /// The service answered with a non-success HTTP status.
    #[error("server returned status {0}")]
    ServerStatus(u16),
    /// The call failed before any response was received (refused, DNS, offline).
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// The service answered, but the body is not JSON.
    #[error("reply body is not valid JSON")]
    MalformedBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_error_display() {
        assert_eq!(DispatchError::Timeout.to_string(), "request timed out");
        assert_eq!(
            DispatchError::ServerStatus(503).to_string(),
            "server returned status 503"
        );
        assert_eq!(
            DispatchError::NetworkFailure("dns error".to_string()).to_string(),
            "network failure: dns error"
        );
        assert_eq!(
            DispatchError::MalformedBody.to_string(),
            "reply body is not valid JSON"
        );
    }
}
