//! `prledger create-initial`: capture a freshly opened repair PR.

use super::{Context, Outcome, PrArgs, check, emit_outcome, open_ledger, read_input, record_id};
use crate::github::GitHubClient;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use prledger_core::error::LedgerError;
use prledger_core::lifecycle::{self, Operation};
use prledger_core::model::RepairStatistics;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CreateInitialArgs {
    #[command(flatten)]
    pub pr: PrArgs,

    /// Statistics JSON written by the repair tool for this PR.
    #[arg(short = 's', long, value_name = "PATH")]
    pub stats_file: Option<PathBuf>,
}

/// Execute `prledger create-initial`.
///
/// Fails with `DuplicateRecord` before contacting GitHub if the PR is
/// already in the ledger.
///
/// # Errors
///
/// Returns an error if any precondition, fetch, or write fails. The ledger
/// file is left untouched in every failure case.
pub fn run_create_initial(args: &CreateInitialArgs, ctx: &Context<'_>) -> Result<()> {
    let id = record_id(ctx.output, &args.pr)?;
    let statistics = match &args.stats_file {
        Some(path) => load_statistics(ctx, path)?,
        None => RepairStatistics::empty(),
    };

    let config = ctx.resolve_config(args.pr.prs_json_file.as_deref())?;
    let ledger = open_ledger(ctx.output, &config)?;
    check(
        ctx.output,
        lifecycle::check_precondition(ledger.store(), &id, Operation::CreateInitial),
    )?;

    let client = GitHubClient::new(&config);
    let capture = check(
        ctx.output,
        lifecycle::capture_initial(&client, &id, statistics),
    )?;
    let record = check(
        ctx.output,
        lifecycle::create_initial(ledger.store(), &id, capture, Utc::now()),
    )?;

    let outcome = Outcome::new(Operation::CreateInitial, &id, ledger.path(), &record);
    check(ctx.output, ledger.commit(id, record))?;
    emit_outcome(ctx, &outcome)
}

fn load_statistics(ctx: &Context<'_>, path: &Path) -> Result<RepairStatistics> {
    let raw = read_input(ctx.output, path, "statistics file")?;
    let parsed = serde_json::from_str(&raw)
        .map_err(|err| LedgerError::MalformedStatistics {
            reason: format!("{}: {err}", path.display()),
        })
        .and_then(RepairStatistics::from_value);
    check(ctx.output, parsed)
}
