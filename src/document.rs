//! Editable free-text documents with an explicit save lifecycle.
//!
//! ```text
//! idle ──save()──▶ saving ──ok──▶ saved ──revert──▶ idle
//!                     └────err──▶ error ──revert──▶ idle
//! ```
//!
//! `save()` is rejected only while `saving`, so at most one write per
//! document is ever in flight. The write carries a snapshot of the text taken
//! when the save started; edits made while it is outstanding go out with the
//! next save. `saved` and `error` revert to `idle` on their own after a fixed
//! window, driven by a [`ScheduledTask`] the document owns and cancels on
//! close.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::fetcher::Resource;
use crate::scheduler::ScheduledTask;
use crate::transport::Transport;

/// The editable documents the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    BotKnowledgeBase,
    BotInstructions,
    EcomKnowledgeBase,
}

impl DocumentKind {
    pub fn resource(&self) -> Resource {
        match self {
            DocumentKind::BotKnowledgeBase => Resource::BotKnowledgeBase,
            DocumentKind::BotInstructions => Resource::BotInstructions,
            DocumentKind::EcomKnowledgeBase => Resource::EcomKnowledgeBase,
        }
    }

    pub fn path(&self) -> &'static str {
        self.resource().path()
    }

    /// Request body for a write of `text`.
    pub fn write_body(&self, text: &str) -> Value {
        match self {
            DocumentKind::BotInstructions => json!({ "instructions": text }),
            DocumentKind::BotKnowledgeBase | DocumentKind::EcomKnowledgeBase => {
                json!({ "content": text })
            }
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource().name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaveState::Idle => "idle",
            SaveState::Saving => "saving",
            SaveState::Saved => "saved",
            SaveState::Error => "error",
        })
    }
}

/// What a call to [`DocumentSync::save`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
    /// A save was already in flight; nothing was sent.
    Rejected,
    /// The document was closed before the write settled; the result was dropped.
    Discarded,
}

#[derive(Debug, Default)]
struct DocState {
    text: String,
    save_state: SaveState,
    /// Bumped on every save start so a stale revert can tell it lost the race.
    generation: u64,
    revert: Option<ScheduledTask>,
    closed: bool,
}

/// A single editable document bound to one backend endpoint.
pub struct DocumentSync {
    kind: DocumentKind,
    state: Arc<Mutex<DocState>>,
    transport: Arc<dyn Transport>,
    revert_after: Duration,
}

impl DocumentSync {
    pub fn new(kind: DocumentKind, transport: Arc<dyn Transport>, revert_after: Duration) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(DocState::default())),
            transport,
            revert_after,
        }
    }

    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    pub fn save_state(&self) -> SaveState {
        self.state.lock().save_state
    }

    /// Replace the text with freshly fetched content.
    pub fn load(&self, text: impl Into<String>) {
        self.state.lock().text = text.into();
    }

    /// Local edit. Applied immediately; does not touch the save state.
    pub fn edit(&self, text: impl Into<String>) {
        self.state.lock().text = text.into();
    }

    /// Write the current text to the backend.
    pub async fn save(&self) -> SaveOutcome {
        run_save(
            self.kind,
            self.state.clone(),
            self.transport.clone(),
            self.revert_after,
        )
        .await
    }

    /// Like [`save`](Self::save) but runs in the background, so the caller can
    /// keep interacting (or tear the document down) while the write is out.
    pub fn spawn_save(&self) -> JoinHandle<SaveOutcome> {
        tokio::spawn(run_save(
            self.kind,
            self.state.clone(),
            self.transport.clone(),
            self.revert_after,
        ))
    }

    /// Cancel the pending revert and ignore any write still in flight.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        if let Some(revert) = state.revert.take() {
            revert.cancel();
        }
    }
}

impl Drop for DocumentSync {
    fn drop(&mut self) {
        self.close();
    }
}

/// Puts the document back to idle if the save future is dropped mid-flight.
struct InFlight {
    state: Weak<Mutex<DocState>>,
    generation: u64,
    armed: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock();
            if state.generation == self.generation && state.save_state == SaveState::Saving {
                state.save_state = SaveState::Idle;
            }
        }
    }
}

async fn run_save(
    kind: DocumentKind,
    state: Arc<Mutex<DocState>>,
    transport: Arc<dyn Transport>,
    revert_after: Duration,
) -> SaveOutcome {
    let (snapshot, generation) = {
        let mut s = state.lock();
        if s.closed {
            return SaveOutcome::Discarded;
        }
        if s.save_state == SaveState::Saving {
            tracing::debug!(document = %kind, "save rejected: already saving");
            return SaveOutcome::Rejected;
        }
        if let Some(revert) = s.revert.take() {
            revert.cancel();
        }
        s.generation += 1;
        s.save_state = SaveState::Saving;
        (s.text.clone(), s.generation)
    };
    let mut guard = InFlight {
        state: Arc::downgrade(&state),
        generation,
        armed: true,
    };

    let result = transport.post(kind.path(), kind.write_body(&snapshot)).await;
    guard.armed = false;

    let mut s = state.lock();
    if s.closed {
        tracing::debug!(document = %kind, "late save completion discarded");
        return SaveOutcome::Discarded;
    }
    let outcome = match result {
        Ok(_) => {
            tracing::info!(document = %kind, bytes = snapshot.len(), "document saved");
            s.save_state = SaveState::Saved;
            SaveOutcome::Saved
        }
        Err(e) => {
            tracing::warn!(document = %kind, error = %e, "document save failed");
            s.save_state = SaveState::Error;
            SaveOutcome::Failed(e.to_string())
        }
    };

    let weak = Arc::downgrade(&state);
    s.revert = Some(ScheduledTask::after(revert_after, move || {
        if let Some(state) = weak.upgrade() {
            let mut s = state.lock();
            if s.generation == generation
                && matches!(s.save_state, SaveState::Saved | SaveState::Error)
            {
                s.save_state = SaveState::Idle;
            }
        }
    }));

    outcome
}
