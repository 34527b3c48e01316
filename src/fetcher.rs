//! Batched reads against the backend.
//!
//! A screen activation produces a [`FetchPlan`]: the minimal set of
//! [`Resource`]s that tab needs. [`DataFetcher::fetch`] issues every read in
//! the plan concurrently and waits for all of them to settle before
//! returning, so a screen either commits the whole batch or nothing.
//!
//! A failed fetch is terminal for that attempt: it is logged and the caller
//! keeps its last-good state. There is no retry, no backoff, and no merging
//! of partial results.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::ApiError;
use crate::transport::Transport;

/// Every read endpoint the dashboards use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Emails,
    BotKnowledgeBase,
    BotInstructions,
    BotConnectors,
    QualitativeDashboard,
    QualitativeConnectors,
    EcomKnowledgeBase,
    EcomConnectors,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Emails => "/emails",
            Resource::BotKnowledgeBase => "/bot/knowledge-base",
            Resource::BotInstructions => "/bot/instructions",
            Resource::BotConnectors => "/bot/connectors/status",
            Resource::QualitativeDashboard => "/qualitative/dashboard",
            Resource::QualitativeConnectors => "/qualitative/connectors",
            Resource::EcomKnowledgeBase => "/ecom-agent/knowledge-base",
            Resource::EcomConnectors => "/ecom-agent/connectors",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Emails => "emails",
            Resource::BotKnowledgeBase => "bot knowledge base",
            Resource::BotInstructions => "bot instructions",
            Resource::BotConnectors => "bot connectors",
            Resource::QualitativeDashboard => "qualitative dashboard",
            Resource::QualitativeConnectors => "qualitative connectors",
            Resource::EcomKnowledgeBase => "ecom knowledge base",
            Resource::EcomConnectors => "ecom connectors",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The resources one activation reads. Order is kept, duplicates dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPlan {
    resources: Vec<Resource>,
}

impl FetchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: Resource) -> Self {
        if !self.resources.contains(&resource) {
            self.resources.push(resource);
        }
        self
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<Resource> for FetchPlan {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        iter.into_iter().fold(FetchPlan::new(), FetchPlan::with)
    }
}

/// Raw payloads from one fully settled, fully successful fetch.
#[derive(Debug, Default)]
pub struct Batch {
    payloads: HashMap<Resource, Value>,
}

impl Batch {
    pub fn contains(&self, resource: Resource) -> bool {
        self.payloads.contains_key(&resource)
    }

    /// Decode the payload for `resource`. Taking a resource the plan did not
    /// include is a decode error, not a panic.
    pub fn take<T: DeserializeOwned>(&mut self, resource: Resource) -> Result<T, ApiError> {
        let value = self.payloads.remove(&resource).unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ApiError::decode(resource.name(), e))
    }
}

/// Result of activating a screen tab.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every resource arrived and was committed.
    Applied,
    /// The attempt failed; the screen kept its previous state.
    Failed(ApiError),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }
}

/// Issues the reads of a [`FetchPlan`] in parallel.
#[derive(Clone)]
pub struct DataFetcher {
    transport: Arc<dyn Transport>,
}

impl DataFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch every resource in `plan`. Returns only after all requests have
    /// settled; any failure fails the whole batch.
    pub async fn fetch(&self, plan: &FetchPlan) -> Result<Batch, ApiError> {
        let mut set = JoinSet::new();
        for &resource in plan.resources() {
            let transport = self.transport.clone();
            set.spawn(async move { (resource, transport.get(resource.path()).await) });
        }

        let mut batch = Batch::default();
        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((resource, Ok(value))) => {
                    batch.payloads.insert(resource, value);
                }
                Ok((resource, Err(e))) => {
                    tracing::warn!(%resource, error = %e, "fetch failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "fetch task did not complete");
                    first_error.get_or_insert(ApiError::Task(e.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(batch),
        }
    }
}
