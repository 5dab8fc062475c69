//! `prledger finalize`: record the merged or closed state of a PR.

use super::{Context, Outcome, PrArgs, check, emit_outcome, open_ledger, record_id};
use crate::github::GitHubClient;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use prledger_core::lifecycle::{self, Operation};

#[derive(Args, Debug)]
pub struct FinalizeArgs {
    #[command(flatten)]
    pub pr: PrArgs,
}

/// Execute `prledger finalize`.
///
/// # Errors
///
/// Returns `MissingInitialRecord` before contacting GitHub if the PR was
/// never captured, or an error if the fetch or write fails.
pub fn run_finalize(args: &FinalizeArgs, ctx: &Context<'_>) -> Result<()> {
    let id = record_id(ctx.output, &args.pr)?;
    let config = ctx.resolve_config(args.pr.prs_json_file.as_deref())?;
    let ledger = open_ledger(ctx.output, &config)?;
    check(
        ctx.output,
        lifecycle::check_precondition(ledger.store(), &id, Operation::Finalize),
    )?;

    let client = GitHubClient::new(&config);
    let capture = check(ctx.output, lifecycle::capture_final(&client, &id))?;
    let record = check(
        ctx.output,
        lifecycle::finalize(ledger.store(), &id, capture, Utc::now()),
    )?;

    let outcome = Outcome::new(Operation::Finalize, &id, ledger.path(), &record);
    check(ctx.output, ledger.commit(id, record))?;
    emit_outcome(ctx, &outcome)
}
