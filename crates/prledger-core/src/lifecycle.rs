//! Record lifecycle: initial capture, final capture, manual-edit annotations.
//!
//! Each operation is a pure function of the current store snapshot and its
//! inputs. It returns the new record without touching the store; the caller
//! upserts the record and persists the whole document. Every precondition is
//! checked before anything is built, so a failed operation has no effect.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::LedgerError;
use crate::model::{ManualEdit, PrRecord, PrState, RecordId, RepairStatistics};
use crate::store::LedgerStore;
use crate::upstream::PullRequestSource;

/// The three mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateInitial,
    Finalize,
    AddManualEdit,
}

impl Operation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::CreateInitial => "create-initial",
            Self::Finalize => "finalize",
            Self::AddManualEdit => "add-manual-edit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data captured when the repair PR is first opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialCapture {
    pub pr_state: PrState,
    pub initial_diff: String,
    pub repair_statistics: RepairStatistics,
}

/// Data captured once the PR has been closed or merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalCapture {
    pub pr_state: PrState,
    pub final_diff: String,
}

/// Check whether `operation` may run against `id` in `store`.
///
/// Lets callers fail before doing any network I/O.
///
/// # Errors
///
/// - [`LedgerError::DuplicateRecord`] for `CreateInitial` on an existing id.
/// - [`LedgerError::MissingInitialRecord`] for `Finalize` on an absent id.
/// - [`LedgerError::RecordNotFound`] for `AddManualEdit` on an absent id.
pub fn check_precondition(
    store: &LedgerStore,
    id: &RecordId,
    operation: Operation,
) -> Result<(), LedgerError> {
    let exists = store.contains(id);
    match operation {
        Operation::CreateInitial if exists => Err(LedgerError::DuplicateRecord { id: id.clone() }),
        Operation::Finalize if !exists => {
            Err(LedgerError::MissingInitialRecord { id: id.clone() })
        }
        Operation::AddManualEdit if !exists => Err(LedgerError::RecordNotFound { id: id.clone() }),
        _ => Ok(()),
    }
}

/// Build the initial record for `id`.
///
/// # Errors
///
/// Returns [`LedgerError::DuplicateRecord`] if `id` is already in `store`.
pub fn create_initial(
    store: &LedgerStore,
    id: &RecordId,
    capture: InitialCapture,
    now: DateTime<Utc>,
) -> Result<PrRecord, LedgerError> {
    check_precondition(store, id, Operation::CreateInitial)?;

    let InitialCapture {
        pr_state,
        initial_diff,
        repair_statistics,
    } = capture;

    tracing::info!(record = %id, "creating initial record");
    Ok(PrRecord::new(
        id.repo_slug(),
        pr_state,
        repair_statistics,
        initial_diff,
        now,
    ))
}

/// Merge the final PR state and diff into the existing record for `id`.
///
/// Finalizing an already finalized record overwrites its state and final
/// diff; a PR can be merged after it was first captured as closed.
///
/// # Errors
///
/// Returns [`LedgerError::MissingInitialRecord`] if `id` is not in `store`.
pub fn finalize(
    store: &LedgerStore,
    id: &RecordId,
    capture: FinalCapture,
    now: DateTime<Utc>,
) -> Result<PrRecord, LedgerError> {
    let Some(existing) = store.get(id) else {
        return Err(LedgerError::MissingInitialRecord { id: id.clone() });
    };

    if existing.is_finalized() {
        tracing::warn!(record = %id, "record already finalized, overwriting final capture");
    }

    let mut record = existing.clone();
    record.apply_final(capture.pr_state, capture.final_diff, now);
    tracing::info!(record = %id, "finalized record");
    Ok(record)
}

/// Append `edit` to the manual edits of the record for `id`.
///
/// # Errors
///
/// Returns [`LedgerError::RecordNotFound`] if `id` is not in `store`, or
/// [`LedgerError::InvalidManualEdit`] if the reason is blank.
pub fn append_manual_edit(
    store: &LedgerStore,
    id: &RecordId,
    edit: ManualEdit,
    now: DateTime<Utc>,
) -> Result<PrRecord, LedgerError> {
    let Some(existing) = store.get(id) else {
        return Err(LedgerError::RecordNotFound { id: id.clone() });
    };

    if edit.reason.trim().is_empty() {
        return Err(LedgerError::InvalidManualEdit {
            id: id.clone(),
            reason: "edit reason must not be empty",
        });
    }

    let mut record = existing.clone();
    let edit_type = edit.edit_type;
    record.push_manual_edit(edit, now);
    tracing::info!(
        record = %id,
        edit_type = %edit_type,
        edits = record.manual_edits().len(),
        "appended manual edit"
    );
    Ok(record)
}

/// Fetch everything an initial record needs from `source`.
///
/// # Errors
///
/// Returns [`LedgerError::UpstreamFetchFailure`] if the metadata or the diff
/// cannot be fetched.
pub fn capture_initial(
    source: &impl PullRequestSource,
    id: &RecordId,
    repair_statistics: RepairStatistics,
) -> Result<InitialCapture, LedgerError> {
    let (pr_state, initial_diff) = fetch_state_and_diff(source, id)?;
    Ok(InitialCapture {
        pr_state,
        initial_diff,
        repair_statistics,
    })
}

/// Fetch everything a final capture needs from `source`.
///
/// # Errors
///
/// Returns [`LedgerError::UpstreamFetchFailure`] if the metadata or the diff
/// cannot be fetched.
pub fn capture_final(
    source: &impl PullRequestSource,
    id: &RecordId,
) -> Result<FinalCapture, LedgerError> {
    let (pr_state, final_diff) = fetch_state_and_diff(source, id)?;
    Ok(FinalCapture {
        pr_state,
        final_diff,
    })
}

fn fetch_state_and_diff(
    source: &impl PullRequestSource,
    id: &RecordId,
) -> Result<(PrState, String), LedgerError> {
    let snapshot =
        source
            .fetch_pull_request(id)
            .map_err(|err| LedgerError::UpstreamFetchFailure {
                id: id.clone(),
                what: "pull request metadata",
                message: err.message,
            })?;

    let diff = source
        .fetch_diff(&snapshot.diff_url)
        .map_err(|err| LedgerError::UpstreamFetchFailure {
            id: id.clone(),
            what: "diff",
            message: err.message,
        })?;

    tracing::debug!(record = %id, diff_bytes = diff.len(), "fetched pull request");
    Ok((snapshot.state, diff))
}
