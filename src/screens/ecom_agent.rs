//! Ecom Agent screen: connected data sources, knowledge base, and agent chat.

use std::sync::Arc;

use super::Screen;
use crate::chat::{ChatEndpoint, ChatSession};
use crate::config::Config;
use crate::document::{DocumentKind, DocumentSync};
use crate::error::ApiError;
use crate::fetcher::{Batch, FetchPlan, Resource};
use crate::models::{Connector, ConnectorsPayload, KnowledgeBasePayload};
use crate::transport::Transport;
use crate::view::ViewState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EcomTab {
    #[default]
    Connectors,
    Knowledge,
    Chat,
}

pub struct EcomAgentScreen {
    pub knowledge_base: DocumentSync,
    pub connectors: ViewState<Connector>,
    pub chat: ChatSession,
}

impl EcomAgentScreen {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            knowledge_base: DocumentSync::new(
                DocumentKind::EcomKnowledgeBase,
                transport.clone(),
                config.revert_after(),
            ),
            connectors: ViewState::new(config.view.selection),
            chat: ChatSession::new(ChatEndpoint::EcomAgent, transport),
        }
    }
}

impl Screen for EcomAgentScreen {
    type Tab = EcomTab;

    fn name(&self) -> &'static str {
        "ecom-agent"
    }

    /// The chat tab reads nothing; the transcript is client-held.
    fn plan(&self, tab: EcomTab) -> FetchPlan {
        match tab {
            EcomTab::Connectors | EcomTab::Knowledge => FetchPlan::new()
                .with(Resource::EcomKnowledgeBase)
                .with(Resource::EcomConnectors),
            EcomTab::Chat => FetchPlan::new(),
        }
    }

    fn enter(&mut self, tab: EcomTab) {
        if tab != EcomTab::Connectors {
            self.connectors.clear_selection();
        }
    }

    fn apply(&mut self, _tab: EcomTab, mut batch: Batch) -> Result<(), ApiError> {
        let kb: KnowledgeBasePayload = batch.take(Resource::EcomKnowledgeBase)?;
        let connectors: ConnectorsPayload = batch.take(Resource::EcomConnectors)?;

        self.knowledge_base.load(kb.knowledge_base);
        self.connectors.replace(connectors.connectors);
        Ok(())
    }
}
