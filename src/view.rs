//! Pure view state: collection, filter, and selection.
//!
//! A [`ViewState`] is a synchronous projection of the last successful fetch.
//! It never talks to the network. Given the same collection and the same
//! sequence of user actions it always yields the same derived view.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::Record;

/// The single active discriminator a view is filtered by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(tag) => record.discriminator() == tag,
        }
    }
}

impl FromStr for Filter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            Ok(Filter::Only(s.to_string()))
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Only(tag) => f.write_str(tag),
        }
    }
}

/// What happens to the selection when the collection is replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Keep the selection if the new collection still has a record with the
    /// same key (it then resolves to the new snapshot); clear it otherwise.
    #[default]
    ClearOnMiss,
    /// Clear the selection on every replacement.
    ClearAlways,
}

/// Collection + filter + selection for one kind of record.
#[derive(Debug, Clone)]
pub struct ViewState<R: Record> {
    records: Vec<R>,
    filter: Filter,
    selected: Option<R::Key>,
    policy: SelectionPolicy,
}

impl<R: Record> Default for ViewState<R> {
    fn default() -> Self {
        Self::new(SelectionPolicy::default())
    }
}

impl<R: Record> ViewState<R> {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            records: Vec::new(),
            filter: Filter::All,
            selected: None,
            policy,
        }
    }

    /// Replace the whole collection with a fresh fetch result.
    pub fn replace(&mut self, records: Vec<R>) {
        self.records = records;
        let keep = match (&self.selected, self.policy) {
            (None, _) | (_, SelectionPolicy::ClearAlways) => false,
            (Some(key), SelectionPolicy::ClearOnMiss) => {
                self.records.iter().any(|r| &r.key() == key)
            }
        };
        if !keep {
            if let Some(key) = self.selected.take() {
                tracing::debug!(?key, policy = ?self.policy, "selection cleared on refetch");
            }
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Records matching the active filter, in collection order.
    pub fn derived(&self) -> Vec<&R> {
        self.records
            .iter()
            .filter(|r| self.filter.matches(*r))
            .collect()
    }

    /// Select the record with `key`. Returns `false` (and leaves the current
    /// selection alone) when the collection has no such record.
    pub fn select(&mut self, key: &R::Key) -> bool {
        if self.records.iter().any(|r| &r.key() == key) {
            self.selected = Some(key.clone());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_key(&self) -> Option<&R::Key> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&R> {
        let key = self.selected.as_ref()?;
        self.records.iter().find(|r| &r.key() == key)
    }

    /// Number of records per discriminator value.
    pub fn counts_by_discriminator(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.discriminator().to_string()).or_insert(0) += 1;
        }
        counts
    }
}
