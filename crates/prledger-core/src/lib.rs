//! prledger-core library.
//!
//! Keeps a JSON ledger of automated-repair pull requests: what was proposed
//! when the PR was opened, what was merged, and which manual edits happened
//! in between. The [`report`] module renders the ledger as Markdown.
//!
//! # Conventions
//!
//! - **Errors**: [`error::LedgerError`] for domain failures, `anyhow::Result`
//!   at the config and report-writing edges.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod lock;
pub mod model;
pub mod report;
pub mod store;
pub mod upstream;
