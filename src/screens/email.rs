//! Email triage screen: inbox, bot training, and statistics.

use std::sync::Arc;

use super::Screen;
use crate::chat::{ChatEndpoint, ChatSession};
use crate::config::Config;
use crate::document::{DocumentKind, DocumentSync};
use crate::error::ApiError;
use crate::fetcher::{Batch, FetchPlan, Resource};
use crate::models::{
    Connector, ConnectorsPayload, Email, EmailStats, EmailsPayload, InstructionsPayload,
    KnowledgeBasePayload,
};
use crate::transport::Transport;
use crate::view::ViewState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmailTab {
    #[default]
    Inbox,
    Train,
    Stats,
}

pub struct EmailScreen {
    pub emails: ViewState<Email>,
    pub stats: Option<EmailStats>,
    pub knowledge_base: DocumentSync,
    pub instructions: DocumentSync,
    pub connectors: ViewState<Connector>,
    pub chat: ChatSession,
}

impl EmailScreen {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let policy = config.view.selection;
        Self {
            emails: ViewState::new(policy),
            stats: None,
            knowledge_base: DocumentSync::new(
                DocumentKind::BotKnowledgeBase,
                transport.clone(),
                config.revert_after(),
            ),
            instructions: DocumentSync::new(
                DocumentKind::BotInstructions,
                transport.clone(),
                config.revert_after(),
            ),
            connectors: ViewState::new(policy),
            chat: ChatSession::new(ChatEndpoint::Bot, transport),
        }
    }

    pub fn document(&self, kind: DocumentKind) -> Option<&DocumentSync> {
        match kind {
            DocumentKind::BotKnowledgeBase => Some(&self.knowledge_base),
            DocumentKind::BotInstructions => Some(&self.instructions),
            DocumentKind::EcomKnowledgeBase => None,
        }
    }
}

impl Screen for EmailScreen {
    type Tab = EmailTab;

    fn name(&self) -> &'static str {
        "email"
    }

    fn plan(&self, tab: EmailTab) -> FetchPlan {
        let plan = FetchPlan::new().with(Resource::Emails);
        match tab {
            EmailTab::Inbox | EmailTab::Stats => plan,
            EmailTab::Train => plan
                .with(Resource::BotKnowledgeBase)
                .with(Resource::BotInstructions)
                .with(Resource::BotConnectors),
        }
    }

    /// Each selection belongs to one tab: emails to the inbox, connectors to
    /// train. Switching away from the owning tab drops it.
    fn enter(&mut self, tab: EmailTab) {
        if tab != EmailTab::Inbox {
            self.emails.clear_selection();
        }
        if tab != EmailTab::Train {
            self.connectors.clear_selection();
        }
    }

    fn apply(&mut self, tab: EmailTab, mut batch: Batch) -> Result<(), ApiError> {
        let emails: EmailsPayload = batch.take(Resource::Emails)?;
        let training = if tab == EmailTab::Train {
            let kb: KnowledgeBasePayload = batch.take(Resource::BotKnowledgeBase)?;
            let instructions: InstructionsPayload = batch.take(Resource::BotInstructions)?;
            let connectors: ConnectorsPayload = batch.take(Resource::BotConnectors)?;
            Some((kb, instructions, connectors))
        } else {
            None
        };

        self.emails.replace(emails.emails);
        self.stats = Some(emails.email_statistics);
        if let Some((kb, instructions, connectors)) = training {
            self.knowledge_base.load(kb.knowledge_base);
            self.instructions.load(instructions.instructions);
            self.connectors.replace(connectors.connectors);
        }
        Ok(())
    }
}
