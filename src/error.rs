//! Errors raised at the API boundary.
//!
//! None of these reach the user directly. The orchestration layer absorbs
//! each one into a local, recoverable state: an unchanged screen for fetches,
//! `SaveState::Error` for document writes, and a fallback transcript entry for
//! chat.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected payload for {resource}: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("fetch task failed: {0}")]
    Task(String),
}

impl ApiError {
    pub fn decode(resource: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { resource, source }
    }
}
