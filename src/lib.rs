//! # Dashboard Harness
//!
//! Client-side orchestration for the email triage, qualitative analytics, and
//! ecom-agent dashboards.
//!
//! Every decision that matters (sentiment, AI replies, analytics) is made by
//! the backend. This crate owns what happens on the client: which reads a tab
//! issues, how their results are committed, how views are filtered and
//! selected, how an edited document is saved, and how a chat transcript
//! grows.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  activate(tab)  ┌─────────────┐  FetchPlan  ┌─────────────┐
//! │  Screen  │────────────────▶│ DataFetcher │────────────▶│  Transport  │──▶ HTTP API
//! │ (tabs)   │◀────────────────│ (parallel)  │◀────────────│  (reqwest)  │
//! └────┬─────┘   Batch (all    └─────────────┘             └──────▲──────┘
//!      │         or nothing)                                      │
//!      ├── ViewState<Record>   filter / select (pure)             │
//!      ├── DocumentSync        idle → saving → saved|error → idle ┤
//!      └── ChatSession         append-only transcript ────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Records and wire payloads |
//! | [`transport`] | HTTP boundary |
//! | [`fetcher`] | Batched, all-or-nothing reads |
//! | [`view`] | Filter and selection projection |
//! | [`reltime`] | Relative timestamps |
//! | [`scheduler`] | Cancellable one-shot timers |
//! | [`document`] | Editable documents and save lifecycle |
//! | [`chat`] | Chat transcripts |
//! | [`screens`] | The three dashboards |
//! | [`console`] | Terminal rendering for the `dash` CLI |

pub mod chat;
pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod reltime;
pub mod scheduler;
pub mod screens;
pub mod transport;
pub mod view;
