//! HTTP dispatcher: `POST {root}/chat` with `{"query": ...}`, JSON in and out.
//!
//! The whole exchange (connect, headers, body) races a single deadline. Whichever side
//! loses is dropped before `send` returns: an expired deadline drops the in-flight
//! request future (closing the connection), a finished request drops the timer.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Serialize;

use super::{DispatchOutcome, RequestContext, RequestDispatcher};
use crate::error::DispatchError;

/// Dispatcher backed by a reqwest client.
#[derive(Clone)]
pub struct HttpDispatcher {
    chat_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

impl HttpDispatcher {
    pub fn new(chat_url: impl Into<String>) -> Self {
        Self::with_client(chat_url, reqwest::Client::new())
    }

    pub fn with_client(chat_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            chat_url: chat_url.into(),
            client,
        }
    }

    /// Endpoint every query is posted to.
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn round_trip(&self, query: &str) -> Result<serde_json::Value, DispatchError> {
        let res = self
            .client
            .post(&self.chat_url)
            .header(ACCEPT, "application/json")
            .json(&ChatRequest { query })
            .send()
            .await
            .map_err(|e| {
                log::debug!("dispatch: transport error: {:?}", e);
                DispatchError::NetworkFailure(e.to_string())
            })?;
        let status = res.status();
        log::debug!("dispatch: response status {}", status);
        if !status.is_success() {
            return Err(DispatchError::ServerStatus(status.as_u16()));
        }
        let body = res.bytes().await.map_err(|e| {
            log::debug!("dispatch: reading body failed: {:?}", e);
            DispatchError::NetworkFailure(e.to_string())
        })?;
        serde_json::from_slice(&body).map_err(|e| {
            log::debug!("dispatch: body is not JSON ({} bytes): {}", body.len(), e);
            DispatchError::MalformedBody
        })
    }
}

#[async_trait]
impl RequestDispatcher for HttpDispatcher {
    async fn send(&self, ctx: RequestContext) -> DispatchOutcome {
        log::debug!(
            "dispatch: POST {} (timeout {}ms)",
            self.chat_url,
            ctx.timeout().as_millis()
        );
        match tokio::time::timeout(ctx.timeout(), self.round_trip(ctx.query())).await {
            Ok(res) => res.into(),
            Err(_) => {
                log::debug!("dispatch: deadline elapsed, request aborted");
                DispatchOutcome::Failure(DispatchError::Timeout)
            }
        }
    }
}
