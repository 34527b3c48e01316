//! Qualitative (e-commerce analytics) screen.
//!
//! The analytics payload is opaque: revenue, orders, channels, products and
//! traffic are computed by the backend and passed through for display.

use serde_json::Value;

use super::Screen;
use crate::config::Config;
use crate::error::ApiError;
use crate::fetcher::{Batch, FetchPlan, Resource};
use crate::models::{Connector, ConnectorsPayload};
use crate::view::ViewState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualitativeTab {
    #[default]
    Dashboard,
    Connectors,
}

pub struct QualitativeScreen {
    pub dashboard: Option<Value>,
    pub connectors: ViewState<Connector>,
    loading: bool,
}

impl QualitativeScreen {
    pub fn new(config: &Config) -> Self {
        Self {
            dashboard: None,
            connectors: ViewState::new(config.view.selection),
            loading: true,
        }
    }

    /// True until the first fetch settles and while any fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

impl Screen for QualitativeScreen {
    type Tab = QualitativeTab;

    fn name(&self) -> &'static str {
        "qualitative"
    }

    fn plan(&self, tab: QualitativeTab) -> FetchPlan {
        match tab {
            QualitativeTab::Dashboard => FetchPlan::new().with(Resource::QualitativeDashboard),
            QualitativeTab::Connectors => FetchPlan::new().with(Resource::QualitativeConnectors),
        }
    }

    fn enter(&mut self, tab: QualitativeTab) {
        if tab != QualitativeTab::Connectors {
            self.connectors.clear_selection();
        }
    }

    fn apply(&mut self, tab: QualitativeTab, mut batch: Batch) -> Result<(), ApiError> {
        match tab {
            QualitativeTab::Dashboard => {
                let payload: Value = batch.take(Resource::QualitativeDashboard)?;
                if !payload.is_object() {
                    return Err(ApiError::decode(
                        Resource::QualitativeDashboard.name(),
                        serde::de::Error::custom("expected a JSON object"),
                    ));
                }
                self.dashboard = Some(payload);
            }
            QualitativeTab::Connectors => {
                let payload: ConnectorsPayload = batch.take(Resource::QualitativeConnectors)?;
                self.connectors.replace(payload.connectors);
            }
        }
        Ok(())
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}
