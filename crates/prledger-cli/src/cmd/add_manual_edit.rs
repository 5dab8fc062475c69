//! `prledger add-manual-edit`: annotate a record with a human-made diff.

use super::{Context, Outcome, PrArgs, check, emit_outcome, open_ledger, read_input, record_id};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use prledger_core::lifecycle::{self, Operation};
use prledger_core::model::{EditType, ManualEdit};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AddManualEditArgs {
    #[command(flatten)]
    pub pr: PrArgs,

    /// File holding the diff of the manual edit.
    #[arg(short = 'd', long, value_name = "PATH")]
    pub diff_file: PathBuf,

    /// Why the edit was needed.
    #[arg(short = 'e', long)]
    pub edit_reason: String,

    /// When the edit was made: before_open_pr or after_open_pr.
    #[arg(short = 't', long, default_value = "after_open_pr")]
    pub edit_type: String,
}

/// Execute `prledger add-manual-edit`. Never contacts GitHub.
///
/// # Errors
///
/// Returns `RecordNotFound` if the PR is not in the ledger, or an error if
/// the diff cannot be read, the edit is invalid, or the write fails.
pub fn run_add_manual_edit(args: &AddManualEditArgs, ctx: &Context<'_>) -> Result<()> {
    let id = record_id(ctx.output, &args.pr)?;
    let edit_type = check(ctx.output, args.edit_type.parse::<EditType>())?;

    let config = ctx.resolve_config(args.pr.prs_json_file.as_deref())?;
    let ledger = open_ledger(ctx.output, &config)?;
    check(
        ctx.output,
        lifecycle::check_precondition(ledger.store(), &id, Operation::AddManualEdit),
    )?;

    let diff = read_input(ctx.output, &args.diff_file, "diff file")?;
    let edit = ManualEdit {
        edit_type,
        reason: args.edit_reason.clone(),
        diff,
    };
    let record = check(
        ctx.output,
        lifecycle::append_manual_edit(ledger.store(), &id, edit, Utc::now()),
    )?;

    let outcome = Outcome::new(Operation::AddManualEdit, &id, ledger.path(), &record);
    check(ctx.output, ledger.commit(id, record))?;
    emit_outcome(ctx, &outcome)
}
