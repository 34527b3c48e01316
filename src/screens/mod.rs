//! Dashboard screens.
//!
//! Each screen is one instantiation of the same pattern: a set of tabs, a
//! [`FetchPlan`] per tab, and an `apply` step that decodes a fully settled
//! [`Batch`] and commits it in one go. [`Dashboard`] drives any [`Screen`]:
//! activating a tab always refetches, and a failed fetch leaves the screen
//! exactly as it was.
//!
//! | Screen | Tabs | Reads |
//! |--------|------|-------|
//! | [`EmailScreen`] | inbox, train, stats | emails (+ bot config on train) |
//! | [`QualitativeScreen`] | dashboard, connectors | one per tab |
//! | [`EcomAgentScreen`] | connectors, knowledge, chat | knowledge base + connectors |

mod ecom_agent;
mod email;
mod qualitative;

pub use ecom_agent::{EcomAgentScreen, EcomTab};
pub use email::{EmailScreen, EmailTab};
pub use qualitative::{QualitativeScreen, QualitativeTab};

use std::fmt::Debug;

use crate::error::ApiError;
use crate::fetcher::{Batch, DataFetcher, FetchOutcome, FetchPlan};

/// A dashboard screen: tabs, what each tab reads, and how a batch is committed.
pub trait Screen {
    type Tab: Copy + Eq + Debug;

    fn name(&self) -> &'static str;

    /// The reads `tab` needs when it becomes active.
    fn plan(&self, tab: Self::Tab) -> FetchPlan;

    /// Decode every payload in `batch`, then commit. Must not modify any
    /// state unless every payload decoded.
    fn apply(&mut self, tab: Self::Tab, batch: Batch) -> Result<(), ApiError>;

    /// Called when `tab` becomes active, before its fetch is issued.
    fn enter(&mut self, _tab: Self::Tab) {}

    fn set_loading(&mut self, _loading: bool) {}
}

/// Drives a [`Screen`] against the backend.
pub struct Dashboard<S: Screen> {
    screen: S,
    fetcher: DataFetcher,
    active: Option<S::Tab>,
}

impl<S: Screen> Dashboard<S> {
    pub fn new(screen: S, fetcher: DataFetcher) -> Self {
        Self {
            screen,
            fetcher,
            active: None,
        }
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn active_tab(&self) -> Option<S::Tab> {
        self.active
    }

    /// Make `tab` active and refetch whatever it reads.
    pub async fn activate(&mut self, tab: S::Tab) -> FetchOutcome {
        self.active = Some(tab);
        self.screen.enter(tab);

        let plan = self.screen.plan(tab);
        if plan.is_empty() {
            return FetchOutcome::Applied;
        }

        let mut loading = Loading::start(&mut self.screen);
        let result = match self.fetcher.fetch(&plan).await {
            Ok(batch) => loading.screen.apply(tab, batch),
            Err(e) => Err(e),
        };
        drop(loading);

        match result {
            Ok(()) => {
                tracing::info!(
                    screen = self.screen.name(),
                    ?tab,
                    resources = plan.resources().len(),
                    "screen refreshed"
                );
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(
                    screen = self.screen.name(),
                    ?tab,
                    error = %e,
                    "refresh failed; keeping previous state"
                );
                FetchOutcome::Failed(e)
            }
        }
    }
}

/// Holds a screen's loading flag up for as long as it lives, so an
/// activation that is dropped mid-fetch still clears it.
struct Loading<'a, S: Screen> {
    screen: &'a mut S,
}

impl<'a, S: Screen> Loading<'a, S> {
    fn start(screen: &'a mut S) -> Self {
        screen.set_loading(true);
        Self { screen }
    }
}

impl<S: Screen> Drop for Loading<'_, S> {
    fn drop(&mut self) {
        self.screen.set_loading(false);
    }
}
