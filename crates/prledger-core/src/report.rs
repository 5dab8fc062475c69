//! Markdown report over the whole ledger.
//!
//! Rendering is a pure transform: [`summarize`] derives the per-PR view from
//! the store and [`Report`] formats it. Records appear in store order.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::LedgerError;
use crate::model::{PrRecord, RepairEntry};
use crate::store::LedgerStore;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What the report shows for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub repo_slug: String,
    pub number: u64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub status: String,
    pub contains_manual_edits: bool,
    /// Sorted ascending by numeric rule key.
    pub repairs: Vec<RepairEntry>,
}

impl PullRequestSummary {
    /// Derive the report view of one record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MalformedStatistics`] if the stored statistics
    /// cannot be read as repair entries.
    pub fn from_record(record: &PrRecord) -> Result<Self, LedgerError> {
        let pr = record.pr_state();
        let mut repairs = record.repair_statistics().repairs()?;
        repairs.sort_by_key(|entry| entry.rule_key);

        Ok(Self {
            repo_slug: record.repo_slug().to_string(),
            number: pr.number,
            created_at: pr.created_at,
            closed_at: pr.closed_or_merged_at(),
            status: pr.status_label().to_string(),
            contains_manual_edits: !record.manual_edits().is_empty(),
            repairs,
        })
    }
}

/// Summaries for every record, in store order.
///
/// # Errors
///
/// Returns the first statistics error encountered.
pub fn summarize(store: &LedgerStore) -> Result<Vec<PullRequestSummary>, LedgerError> {
    store
        .iter()
        .map(|(_, record)| PullRequestSummary::from_record(record))
        .collect()
}

/// The rendered Markdown document.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pull_requests: &'a [PullRequestSummary],
}

impl<'a> Report<'a> {
    #[must_use]
    pub const fn new(pull_requests: &'a [PullRequestSummary]) -> Self {
        Self { pull_requests }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Achievements")?;
        writeln!(
            f,
            "This document presents an overview of the pull requests performed with Sorald."
        )?;

        for pr in self.pull_requests {
            write_pull_request(f, pr)?;
        }
        Ok(())
    }
}

fn write_pull_request(f: &mut fmt::Formatter<'_>, pr: &PullRequestSummary) -> fmt::Result {
    writeln!(f)?;
    writeln!(
        f,
        "## [{slug}#{n}](https://github.com/{slug}/pull/{n})",
        slug = pr.repo_slug,
        n = pr.number
    )?;

    write!(f, "This PR was opened at {}", pr.created_at.format(TIMESTAMP_FORMAT))?;
    if let Some(closed) = pr.closed_at {
        write!(f, " and {} at {}", pr.status, closed.format(TIMESTAMP_FORMAT))?;
    }
    writeln!(f, ".")?;

    if pr.contains_manual_edits {
        writeln!(f, "Some manual edits were performed after applying Sorald.")?;
    } else {
        writeln!(f, "The patch was generated fully automatically with Sorald.")?;
    }

    let tense = if pr.closed_at.is_some() { "provided" } else { "provides" };
    writeln!(f, "It {tense} the following repairs:")?;

    if !pr.repairs.is_empty() {
        writeln!(f)?;
    }
    for repair in &pr.repairs {
        writeln!(
            f,
            "* [Rule {key}](https://rules.sonarsource.com/java/RSPEC-{key})",
            key = repair.rule_key
        )?;
        writeln!(f, "    - Number of violations found: {}", repair.found())?;
        writeln!(f, "    - Number of violations repaired: {}", repair.repaired())?;
    }
    Ok(())
}

/// Render the whole store as Markdown.
///
/// # Errors
///
/// Returns [`LedgerError::MalformedStatistics`] if a record's statistics
/// cannot be read.
pub fn render(store: &LedgerStore) -> Result<String, LedgerError> {
    let summaries = summarize(store)?;
    Ok(Report::new(&summaries).to_string())
}

/// Render the ledger at `ledger_path` into `output_path`, overwriting it.
///
/// # Errors
///
/// Fails if the ledger is missing or cannot be loaded or rendered, or the
/// output cannot be written.
pub fn write_report(ledger_path: &Path, output_path: &Path) -> Result<usize> {
    if !ledger_path.is_file() {
        anyhow::bail!("ledger {} does not exist", ledger_path.display());
    }
    let store = LedgerStore::load(ledger_path)?;
    let rendered = render(&store)
        .with_context(|| format!("failed to render report for {}", ledger_path.display()))?;

    fs::write(output_path, rendered)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    tracing::info!(
        output = %output_path.display(),
        pull_requests = store.len(),
        "wrote report"
    );
    Ok(store.len())
}

#[cfg(test)]
mod tests {
    use super::{PullRequestSummary, Report};
    use crate::model::RepairEntry;
    use chrono::{TimeZone, Utc};

    fn summary() -> PullRequestSummary {
        PullRequestSummary {
            repo_slug: "acme/widget".into(),
            number: 42,
            created_at: Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap(),
            closed_at: None,
            status: "open".into(),
            contains_manual_edits: false,
            repairs: Vec::new(),
        }
    }

    #[test]
    fn open_pr_uses_present_tense_and_no_closing_clause() {
        let pulls = [summary()];
        let text = Report::new(&pulls).to_string();

        assert!(text.contains("This PR was opened at 2021-03-01 09:00:00.\n"));
        assert!(text.contains("It provides the following repairs:"));
        assert!(!text.contains(" and open at "));
    }

    #[test]
    fn closed_pr_uses_past_tense_and_status() {
        let pulls = [PullRequestSummary {
            closed_at: Some(Utc.with_ymd_and_hms(2021, 3, 4, 12, 30, 0).unwrap()),
            status: "merged".into(),
            ..summary()
        }];
        let text = Report::new(&pulls).to_string();

        assert!(text.contains(
            "This PR was opened at 2021-03-01 09:00:00 and merged at 2021-03-04 12:30:00.\n"
        ));
        assert!(text.contains("It provided the following repairs:"));
    }

    #[test]
    fn zero_repairs_render_header_without_list() {
        let pulls = [summary()];
        let text = Report::new(&pulls).to_string();
        assert!(text.ends_with("It provides the following repairs:\n"));
        assert!(!text.contains("* [Rule"));
    }

    #[test]
    fn repair_lines_carry_found_and_repaired_counts() {
        let pulls = [PullRequestSummary {
            repairs: vec![RepairEntry {
                rule_key: 117,
                violations_before: 5,
                violations_after: 2,
            }],
            ..summary()
        }];
        let text = Report::new(&pulls).to_string();

        assert!(text.contains("* [Rule 117](https://rules.sonarsource.com/java/RSPEC-117)\n"));
        assert!(text.contains("    - Number of violations found: 5\n"));
        assert!(text.contains("    - Number of violations repaired: 3\n"));
    }

    #[test]
    fn empty_ledger_renders_only_the_preamble() {
        let text = Report::new(&[]).to_string();
        assert_eq!(
            text,
            "# Achievements\nThis document presents an overview of the pull requests performed with Sorald.\n"
        );
    }
}
