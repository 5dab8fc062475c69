use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::statistics::RepairStatistics;
use crate::error::LedgerError;

/// Snapshot of the hosting service's view of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrState {
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    /// Raw lifecycle state as reported upstream (`open`, `closed`).
    pub state: String,
    pub is_merged: bool,
    pub number: u64,
}

impl PrState {
    /// Overwrite every named field with the freshly fetched snapshot.
    ///
    /// Exhaustive destructuring: a new [`PrState`] field must be merged here.
    pub fn merge_from(&mut self, fresh: Self) {
        let Self {
            url,
            created_at,
            closed_at,
            merged_at,
            state,
            is_merged,
            number,
        } = fresh;

        self.url = url;
        self.created_at = created_at;
        self.closed_at = closed_at;
        self.merged_at = merged_at;
        self.state = state;
        self.is_merged = is_merged;
        self.number = number;
    }

    /// When the PR stopped being open, preferring the close timestamp.
    #[must_use]
    pub fn closed_or_merged_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at.or(self.merged_at)
    }

    /// `merged` when merged, otherwise the raw upstream state.
    #[must_use]
    pub fn status_label(&self) -> &str {
        if self.is_merged { "merged" } else { &self.state }
    }
}

/// When a manual edit was made relative to opening the PR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    BeforeOpenPr,
    #[default]
    AfterOpenPr,
}

impl EditType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeOpenPr => "before_open_pr",
            Self::AfterOpenPr => "after_open_pr",
        }
    }

    /// Human phrasing used in terminal output.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::BeforeOpenPr => "before opening the PR",
            Self::AfterOpenPr => "after opening the PR",
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before_open_pr" => Ok(Self::BeforeOpenPr),
            "after_open_pr" => Ok(Self::AfterOpenPr),
            _ => Err(LedgerError::InvalidEditType(s.to_string())),
        }
    }
}

/// A human-authored diff layered on top of the automated patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEdit {
    #[serde(rename = "type")]
    pub edit_type: EditType,
    pub reason: String,
    pub diff: String,
}

/// The two diff captures of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSnapshots {
    initial: String,
    #[serde(rename = "final")]
    final_diff: Option<String>,
}

impl DiffSnapshots {
    pub(crate) const fn new(initial: String) -> Self {
        Self {
            initial,
            final_diff: None,
        }
    }

    #[must_use]
    pub fn initial(&self) -> &str {
        &self.initial
    }

    #[must_use]
    pub fn final_diff(&self) -> Option<&str> {
        self.final_diff.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl RecordMetadata {
    pub(crate) const fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_modified: now,
        }
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Advance `last_modified`, never moving it backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = self.last_modified.max(now);
    }
}

/// One pull request's ledger entry.
///
/// Fields are only reachable through accessors; the lifecycle operations in
/// [`crate::lifecycle`] are the sole writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrRecord {
    repo_slug: String,
    pr_state: PrState,
    #[serde(default)]
    repair_statistics: RepairStatistics,
    diff_snapshots: DiffSnapshots,
    #[serde(default)]
    manual_edits: Vec<ManualEdit>,
    record_metadata: RecordMetadata,
}

impl PrRecord {
    pub(crate) const fn new(
        repo_slug: String,
        pr_state: PrState,
        repair_statistics: RepairStatistics,
        initial_diff: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            repo_slug,
            pr_state,
            repair_statistics,
            diff_snapshots: DiffSnapshots::new(initial_diff),
            manual_edits: Vec::new(),
            record_metadata: RecordMetadata::new(now),
        }
    }

    #[must_use]
    pub fn repo_slug(&self) -> &str {
        &self.repo_slug
    }

    #[must_use]
    pub const fn pr_state(&self) -> &PrState {
        &self.pr_state
    }

    #[must_use]
    pub const fn repair_statistics(&self) -> &RepairStatistics {
        &self.repair_statistics
    }

    #[must_use]
    pub const fn diff_snapshots(&self) -> &DiffSnapshots {
        &self.diff_snapshots
    }

    #[must_use]
    pub fn manual_edits(&self) -> &[ManualEdit] {
        &self.manual_edits
    }

    #[must_use]
    pub const fn record_metadata(&self) -> &RecordMetadata {
        &self.record_metadata
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.diff_snapshots.final_diff.is_some()
    }

    pub(crate) fn apply_final(&mut self, fresh: PrState, final_diff: String, now: DateTime<Utc>) {
        self.pr_state.merge_from(fresh);
        self.diff_snapshots.final_diff = Some(final_diff);
        self.record_metadata.touch(now);
    }

    pub(crate) fn push_manual_edit(&mut self, edit: ManualEdit, now: DateTime<Utc>) {
        self.manual_edits.push(edit);
        self.record_metadata.touch(now);
    }
}

#[cfg(test)]
mod tests {
    use super::{EditType, PrState, RecordMetadata};
    use chrono::{Duration, TimeZone, Utc};
    use std::str::FromStr;

    fn open_state() -> PrState {
        PrState {
            url: "https://github.com/acme/widget/pull/42".into(),
            created_at: Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap(),
            closed_at: None,
            merged_at: None,
            state: "open".into(),
            is_merged: false,
            number: 42,
        }
    }

    #[test]
    fn merge_overwrites_every_field() {
        let mut current = open_state();
        let closed = Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap();
        let fresh = PrState {
            closed_at: Some(closed),
            merged_at: Some(closed),
            state: "closed".into(),
            is_merged: true,
            ..open_state()
        };

        current.merge_from(fresh.clone());
        assert_eq!(current, fresh);
        assert_eq!(current.status_label(), "merged");
        assert_eq!(current.closed_or_merged_at(), Some(closed));
    }

    #[test]
    fn status_label_uses_raw_state_when_not_merged() {
        let mut state = open_state();
        assert_eq!(state.status_label(), "open");
        state.state = "closed".into();
        assert_eq!(state.status_label(), "closed");
    }

    #[test]
    fn closed_falls_back_to_merged_timestamp() {
        let merged = Utc.with_ymd_and_hms(2021, 3, 5, 0, 0, 0).unwrap();
        let state = PrState {
            merged_at: Some(merged),
            ..open_state()
        };
        assert_eq!(state.closed_or_merged_at(), Some(merged));
    }

    #[test]
    fn edit_type_json_and_text_forms_agree() {
        for value in [EditType::BeforeOpenPr, EditType::AfterOpenPr] {
            let json = serde_json::to_string(&value).unwrap();
            assert_eq!(json, format!("\"{value}\""));
            assert_eq!(EditType::from_str(&value.to_string()).unwrap(), value);
        }
        assert!(EditType::from_str("during_review").is_err());
        assert!(serde_json::from_str::<EditType>("\"during_review\"").is_err());
        assert_eq!(EditType::default(), EditType::AfterOpenPr);
    }

    #[test]
    fn touch_never_moves_backwards() {
        let t0 = Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap();
        let mut meta = RecordMetadata::new(t0);
        meta.touch(t0 - Duration::seconds(30));
        assert_eq!(meta.last_modified(), t0);
        meta.touch(t0 + Duration::seconds(30));
        assert_eq!(meta.last_modified(), t0 + Duration::seconds(30));
        assert_eq!(meta.created_at(), t0);
    }
}
