//! Request dispatch: one bounded outbound call per round trip.
//!
//! [`RequestDispatcher`] is the seam between the conversation session and the network.
//! [`HttpDispatcher`] is the reqwest implementation that talks to the mail-search service.

mod http;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DispatchError;

pub use http::HttpDispatcher;

/// Parameters of one outbound request. Created per submission and dropped after the round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    query: String,
    timeout: Duration,
}

impl RequestContext {
    /// Returns `None` when the query is blank or the timeout is zero.
    pub fn new(query: &str, timeout: Duration) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() || timeout.is_zero() {
            return None;
        }
        Some(Self {
            query: query.to_string(),
            timeout,
        })
    }

    /// Trimmed query text sent as the request body.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Result of one dispatch: a decoded JSON reply or a classified failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Success(serde_json::Value),
    Failure(DispatchError),
}

impl From<Result<serde_json::Value, DispatchError>> for DispatchOutcome {
    fn from(res: Result<serde_json::Value, DispatchError>) -> Self {
        match res {
            Ok(payload) => DispatchOutcome::Success(payload),
            Err(e) => DispatchOutcome::Failure(e),
        }
    }
}

/// Sends one query and waits at most `ctx.timeout()` for the reply.
///
/// Implementations make exactly one call per invocation, never retry, and convert every
/// fault into a [`DispatchOutcome::Failure`]; `send` itself cannot fail.
#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    async fn send(&self, ctx: RequestContext) -> DispatchOutcome;
}

#[async_trait]
impl<T: RequestDispatcher + ?Sized> RequestDispatcher for Arc<T> {
    async fn send(&self, ctx: RequestContext) -> DispatchOutcome {
        self.as_ref().send(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_context_trims_query() {
        let ctx = RequestContext::new("  meeting tomorrow \n", Duration::from_secs(1)).unwrap();
        assert_eq!(ctx.query(), "meeting tomorrow");
        assert_eq!(ctx.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn request_context_rejects_blank_query_and_zero_timeout() {
        assert!(RequestContext::new("", Duration::from_secs(1)).is_none());
        assert!(RequestContext::new(" \t ", Duration::from_secs(1)).is_none());
        assert!(RequestContext::new("x", Duration::ZERO).is_none());
    }

    #[test]
    fn outcome_from_result() {
        let ok: DispatchOutcome = Ok(serde_json::json!({"response": "hi"})).into();
        assert!(matches!(ok, DispatchOutcome::Success(_)));
        let err: DispatchOutcome = Err(DispatchError::Timeout).into();
        assert_eq!(err, DispatchOutcome::Failure(DispatchError::Timeout));
    }
}
