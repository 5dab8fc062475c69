//! GitHub REST backing for [`PullRequestSource`].

use chrono::{DateTime, Utc};
use prledger_core::config::EffectiveConfig;
use prledger_core::model::{PrState, RecordId};
use prledger_core::upstream::{PullRequestSnapshot, PullRequestSource, UpstreamError};
use serde::Deserialize;

const USER_AGENT: &str = concat!("prledger/", env!("CARGO_PKG_VERSION"));

/// The fields of `GET /repos/{owner}/{repo}/pulls/{number}` the ledger keeps.
#[derive(Debug, Clone, Deserialize)]
struct GitHubPull {
    number: u64,
    html_url: String,
    diff_url: String,
    state: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged: Option<bool>,
}

impl GitHubPull {
    fn into_snapshot(self) -> PullRequestSnapshot {
        let is_merged = self.merged.unwrap_or(self.merged_at.is_some());
        PullRequestSnapshot {
            state: PrState {
                url: self.html_url,
                created_at: self.created_at,
                closed_at: self.closed_at,
                merged_at: self.merged_at,
                state: self.state,
                is_merged,
                number: self.number,
            },
            diff_url: self.diff_url,
        }
    }
}

pub struct GitHubClient {
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &EffectiveConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        }
    }

    fn pull_url(&self, id: &RecordId) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url,
            id.owner(),
            id.repo(),
            id.number()
        )
    }

    fn get(&self, url: &str, accept: &str) -> Result<ureq::Response, UpstreamError> {
        let mut request = ureq::get(url)
            .set("Accept", accept)
            .set("User-Agent", USER_AGENT);

        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        tracing::debug!(url, "GitHub request");
        request
            .call()
            .map_err(|err| UpstreamError::new(format!("GitHub request failed for {url}: {err}")))
    }
}

impl PullRequestSource for GitHubClient {
    fn fetch_pull_request(&self, id: &RecordId) -> Result<PullRequestSnapshot, UpstreamError> {
        let url = self.pull_url(id);
        let pull: GitHubPull = self
            .get(&url, "application/vnd.github+json")?
            .into_json()
            .map_err(|err| UpstreamError::new(format!("failed to decode {url}: {err}")))?;
        Ok(pull.into_snapshot())
    }

    fn fetch_diff(&self, url: &str) -> Result<String, UpstreamError> {
        self.get(url, "application/vnd.github.diff")?
            .into_string()
            .map_err(|err| UpstreamError::new(format!("failed to read diff from {url}: {err}")))
    }
}
