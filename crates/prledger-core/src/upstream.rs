//! Seam to the PR hosting service.
//!
//! The core never talks to the network itself. Callers hand it something
//! implementing [`PullRequestSource`]; the CLI backs it with the GitHub REST
//! API and tests back it with fixtures.

use crate::model::{PrState, RecordId};

/// What the hosting service reports for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    pub state: PrState,
    /// Where the raw diff of the PR can be fetched from.
    pub diff_url: String,
}

/// Failure reported by a [`PullRequestSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub message: String,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Lookup of PR metadata and diff bodies.
pub trait PullRequestSource {
    /// Fetch the current metadata of the pull request behind `id`.
    ///
    /// # Errors
    ///
    /// Any transport or decoding failure.
    fn fetch_pull_request(&self, id: &RecordId) -> Result<PullRequestSnapshot, UpstreamError>;

    /// Fetch the raw diff text at `url`.
    ///
    /// # Errors
    ///
    /// Any transport or decoding failure.
    fn fetch_diff(&self, url: &str) -> Result<String, UpstreamError>;
}

impl<T: PullRequestSource + ?Sized> PullRequestSource for &T {
    fn fetch_pull_request(&self, id: &RecordId) -> Result<PullRequestSnapshot, UpstreamError> {
        (**self).fetch_pull_request(id)
    }

    fn fetch_diff(&self, url: &str) -> Result<String, UpstreamError> {
        (**self).fetch_diff(url)
    }
}
