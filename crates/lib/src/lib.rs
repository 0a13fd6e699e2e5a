//! Inbox chat core library: conversation session, request dispatch, reply and failure
//! rendering, used by the CLI front end.

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod init;
pub mod normalize;
pub mod probe;
pub mod session;

pub use classify::ErrorClassifier;
pub use dispatch::{DispatchOutcome, HttpDispatcher, RequestContext, RequestDispatcher};
pub use error::DispatchError;
pub use normalize::{normalize, EmailSummary, ReplyPayload};
pub use session::{ConversationSession, Message, Phase, Sender};
