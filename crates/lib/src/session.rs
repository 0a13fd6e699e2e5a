//! Conversation session: the message log and the single-flight admission gate.
//!
//! A session accepts one query at a time. An admitted query appends a user message, is sent
//! through the [`RequestDispatcher`], and always ends with exactly one bot message built by
//! [`normalize`](crate::normalize::normalize) or [`ErrorClassifier`]. Queries submitted while a
//! round trip is in flight are dropped without touching the log or the network.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::classify::ErrorClassifier;
use crate::config::{BackendConfig, DEFAULT_TIMEOUT_MS};
use crate::dispatch::{DispatchOutcome, HttpDispatcher, RequestContext, RequestDispatcher};
use crate::error::DispatchError;
use crate::normalize::normalize;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single chat line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Admission state. `Sending` rejects new submissions until the reply is appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
}

#[derive(Debug, Default)]
struct SessionState {
    log: Vec<Message>,
    phase: Phase,
}

impl SessionState {
    fn finish(&mut self, reply: Message) {
        self.log.push(reply);
        self.phase = Phase::Idle;
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the `Sending` phase of an admitted round trip.
///
/// If `submit` is dropped before the dispatcher answers, the guard appends the timeout line
/// and reopens the gate, so the user message still gets its reply.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    abandoned_reply: Option<String>,
}

impl InFlight<'_> {
    fn complete(mut self, text: String) -> Message {
        self.abandoned_reply = None;
        let reply = Message::bot(text);
        lock(self.state).finish(reply.clone());
        reply
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(text) = self.abandoned_reply.take() {
            log::warn!("session: round trip abandoned before a reply arrived");
            lock(self.state).finish(Message::bot(text));
        }
    }
}

/// Ordered, append-only conversation with at most one outstanding request.
pub struct ConversationSession<D> {
    dispatcher: D,
    classifier: ErrorClassifier,
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl ConversationSession<HttpDispatcher> {
    /// Session talking to the configured backend over HTTP.
    pub fn from_config(backend: &BackendConfig) -> Self {
        let chat_url = backend.chat_url();
        Self::new(
            HttpDispatcher::new(chat_url.clone()),
            ErrorClassifier::new(chat_url),
            backend.timeout(),
        )
    }
}

impl<D: RequestDispatcher> ConversationSession<D> {
    /// A zero `timeout` would reject every query, so it is replaced by the default deadline.
    pub fn new(dispatcher: D, classifier: ErrorClassifier, timeout: Duration) -> Self {
        let timeout = if timeout.is_zero() {
            log::warn!(
                "session: timeout must be greater than 0, using default of {}ms",
                DEFAULT_TIMEOUT_MS
            );
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            timeout
        };
        Self {
            dispatcher,
            classifier,
            timeout,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Run one round trip for `query`.
    ///
    /// Returns the appended bot message, or `None` when the query is blank or another
    /// round trip is in flight (in which case nothing changed). The user message keeps the
    /// text as typed; the request carries the trimmed query.
    pub async fn submit(&self, query: &str) -> Option<Message> {
        let ctx = {
            let mut state = lock(&self.state);
            if state.phase == Phase::Sending {
                log::debug!("session: busy, ignoring submission");
                return None;
            }
            let ctx = RequestContext::new(query, self.timeout)?;
            state.log.push(Message::user(query));
            state.phase = Phase::Sending;
            ctx
        };
        let in_flight = InFlight {
            state: &self.state,
            abandoned_reply: Some(self.classifier.classify(&DispatchError::Timeout)),
        };

        let text = match self.dispatcher.send(ctx).await {
            DispatchOutcome::Success(payload) => normalize(&payload),
            DispatchOutcome::Failure(err) => {
                log::warn!("session: round trip failed: {}", err);
                self.classifier.classify(&err)
            }
        };

        Some(in_flight.complete(text))
    }

    /// Snapshot of the log in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).log.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase() == Phase::Sending
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Endpoint named in failure hints.
    pub fn target(&self) -> &str {
        self.classifier.target()
    }
}
