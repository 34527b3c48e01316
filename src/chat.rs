//! Client-held chat transcripts.
//!
//! A [`ChatSession`] owns an append-only transcript. `send` appends the user
//! turn synchronously, posts the message with the prior history, and appends
//! exactly one assistant turn when the call settles: the reply on success, a
//! fixed apology on any failure. Raw errors never reach the transcript.
//! If the `send` future is dropped before the call settles, the user turn
//! stays in the transcript with no assistant turn after it, and the session
//! is no longer pending.
//!
//! The `conversation_history` sent with a message is the transcript as it
//! stood *before* that message was appended. The message itself travels in
//! the separate `message` field. Both chat endpoints use this convention.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::ApiError;
use crate::models::{ChatEntry, ChatReply, ChatRequest, HistoryTurn};
use crate::transport::Transport;

/// Assistant turn appended when a chat call fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEndpoint {
    /// Customer-support bot, `/bot/chat`.
    Bot,
    /// E-commerce agent, `/ecom-agent/chat`. Replies cite their sources.
    EcomAgent,
}

impl ChatEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            ChatEndpoint::Bot => "/bot/chat",
            ChatEndpoint::EcomAgent => "/ecom-agent/chat",
        }
    }

    fn keeps_sources(&self) -> bool {
        matches!(self, ChatEndpoint::EcomAgent)
    }
}

impl fmt::Display for ChatEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChatEndpoint::Bot => "bot",
            ChatEndpoint::EcomAgent => "ecom-agent",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Blank,
    Pending,
    Closed,
}

/// What a call to [`ChatSession::send`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend answered; its reply is the last transcript entry.
    Replied,
    /// The call failed; [`FALLBACK_REPLY`] is the last transcript entry.
    FellBack,
    /// Nothing was appended and nothing was sent.
    Ignored(IgnoreReason),
    /// The session closed while the call was out; the reply was dropped.
    Discarded,
}

#[derive(Debug, Default)]
struct ChatState {
    transcript: Vec<ChatEntry>,
    input: String,
    pending: bool,
    closed: bool,
}

pub struct ChatSession {
    endpoint: ChatEndpoint,
    state: Arc<Mutex<ChatState>>,
    transport: Arc<dyn Transport>,
}

impl ChatSession {
    pub fn new(endpoint: ChatEndpoint, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            state: Arc::new(Mutex::new(ChatState::default())),
            transport,
        }
    }

    pub fn endpoint(&self) -> ChatEndpoint {
        self.endpoint
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().input = text.into();
    }

    pub fn input(&self) -> String {
        self.state.lock().input.clone()
    }

    pub fn transcript(&self) -> Vec<ChatEntry> {
        self.state.lock().transcript.clone()
    }

    pub fn last(&self) -> Option<ChatEntry> {
        self.state.lock().transcript.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending
    }

    /// Send whatever is in the input buffer.
    pub async fn submit(&self) -> SendOutcome {
        let message = self.input();
        self.send(&message).await
    }

    pub async fn send(&self, message: &str) -> SendOutcome {
        let history = {
            let mut s = self.state.lock();
            if s.closed {
                return SendOutcome::Ignored(IgnoreReason::Closed);
            }
            if message.trim().is_empty() {
                return SendOutcome::Ignored(IgnoreReason::Blank);
            }
            if s.pending {
                tracing::debug!(endpoint = %self.endpoint, "send ignored: reply pending");
                return SendOutcome::Ignored(IgnoreReason::Pending);
            }
            let history: Vec<HistoryTurn> = s.transcript.iter().map(HistoryTurn::from).collect();
            s.transcript.push(ChatEntry::user(message));
            s.input.clear();
            s.pending = true;
            history
        };
        let _pending = PendingGuard {
            state: Arc::downgrade(&self.state),
        };

        let result = self.request(message, history).await;

        let mut s = self.state.lock();
        if s.closed {
            tracing::debug!(endpoint = %self.endpoint, "late chat reply discarded");
            return SendOutcome::Discarded;
        }
        match result {
            Ok(reply) => {
                let sources = if self.endpoint.keeps_sources() {
                    Some(reply.sources.unwrap_or_default())
                } else {
                    None
                };
                s.transcript
                    .push(ChatEntry::assistant(reply.response, sources));
                SendOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "chat request failed");
                s.transcript.push(ChatEntry::assistant(FALLBACK_REPLY, None));
                SendOutcome::FellBack
            }
        }
    }

    async fn request(
        &self,
        message: &str,
        conversation_history: Vec<HistoryTurn>,
    ) -> Result<ChatReply, ApiError> {
        let body = serde_json::to_value(ChatRequest {
            message: message.to_string(),
            conversation_history,
        })
        .map_err(|e| ApiError::decode("chat request", e))?;
        let value = self.transport.post(self.endpoint.path(), body).await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode("chat reply", e))
    }

    /// Stop accepting messages and drop any reply still in flight.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Clears `pending` however the send ends, including when its future is dropped.
struct PendingGuard {
    state: Weak<Mutex<ChatState>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().pending = false;
        }
    }
}
