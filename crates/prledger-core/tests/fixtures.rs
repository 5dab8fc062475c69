//! Shared fixtures for the ledger integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use prledger_core::model::{PrState, RecordId, RepairStatistics};
use prledger_core::upstream::{PullRequestSnapshot, PullRequestSource, UpstreamError};

pub const INITIAL_DIFF: &str = "diff --git a/src/Main.java b/src/Main.java\n-  int x= 1;\n+  int x = 1;\n";
pub const FINAL_DIFF: &str = "diff --git a/src/Main.java b/src/Main.java\n-  int x= 1;\n+  final int x = 1;\n";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

pub fn widget() -> RecordId {
    RecordId::new("acme", "widget", 42)
}

pub fn open_state(id: &RecordId) -> PrState {
    PrState {
        url: format!("https://github.com/{}/pull/{}", id.repo_slug(), id.number()),
        created_at: t0(),
        closed_at: None,
        merged_at: None,
        state: "open".into(),
        is_merged: false,
        number: id.number(),
    }
}

pub fn merged_state(id: &RecordId) -> PrState {
    PrState {
        closed_at: Some(at(60 * 24)),
        merged_at: Some(at(60 * 24)),
        state: "closed".into(),
        is_merged: true,
        ..open_state(id)
    }
}

/// Statistics for rule 117: five violations found, two left.
pub fn stats_117() -> RepairStatistics {
    RepairStatistics::from_value(json!({
        "repairs": [
            {"ruleKey": "117", "nbViolationsBefore": 5, "nbViolationsAfter": 2}
        ]
    }))
    .unwrap()
}

/// In-memory stand-in for the hosting service.
#[derive(Debug, Clone)]
pub struct FakeSource {
    pub state: PrState,
    pub diff: String,
    pub fail_metadata: bool,
    pub fail_diff: bool,
}

impl FakeSource {
    pub fn new(state: PrState, diff: &str) -> Self {
        Self {
            state,
            diff: diff.to_string(),
            fail_metadata: false,
            fail_diff: false,
        }
    }
}

impl PullRequestSource for FakeSource {
    fn fetch_pull_request(&self, id: &RecordId) -> Result<PullRequestSnapshot, UpstreamError> {
        if self.fail_metadata {
            return Err(UpstreamError::new("503 Service Unavailable"));
        }
        Ok(PullRequestSnapshot {
            state: self.state.clone(),
            diff_url: format!("https://github.com/{}/pull/{}.diff", id.repo_slug(), id.number()),
        })
    }

    fn fetch_diff(&self, _url: &str) -> Result<String, UpstreamError> {
        if self.fail_diff {
            return Err(UpstreamError::new("connection reset by peer"));
        }
        Ok(self.diff.clone())
    }
}
