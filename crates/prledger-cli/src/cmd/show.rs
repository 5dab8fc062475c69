//! `prledger show`: print one ledger record.

use super::{Context, PrArgs, check, record_id};
use crate::output::{field, render, rule, section};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use prledger_core::error::LedgerError;
use prledger_core::model::PrRecord;
use prledger_core::report::PullRequestSummary;
use prledger_core::store::LedgerStore;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub pr: PrArgs,
}

#[derive(Debug, Serialize)]
struct RepairLine {
    rule_key: u64,
    found: u64,
    repaired: u64,
}

/// JSON shape of `prledger show`: the stored record plus derived repair counts.
#[derive(Debug, Serialize)]
struct ShowRecord<'a> {
    id: String,
    record: &'a PrRecord,
    repairs: Vec<RepairLine>,
}

/// Execute `prledger show`. Reads the ledger without locking it.
///
/// # Errors
///
/// Returns `RecordNotFound` if the PR is not in the ledger, or an error if
/// the ledger cannot be loaded.
pub fn run_show(args: &ShowArgs, ctx: &Context<'_>) -> Result<()> {
    let id = record_id(ctx.output, &args.pr)?;
    let config = ctx.resolve_config(args.pr.prs_json_file.as_deref())?;
    let store = check(ctx.output, LedgerStore::load(&config.ledger_path))?;

    let record = check(
        ctx.output,
        store
            .get(&id)
            .ok_or_else(|| LedgerError::RecordNotFound { id: id.clone() }),
    )?;
    let summary = check(ctx.output, PullRequestSummary::from_record(record))?;

    let view = ShowRecord {
        id: id.to_string(),
        record,
        repairs: summary
            .repairs
            .iter()
            .map(|entry| RepairLine {
                rule_key: entry.rule_key,
                found: entry.found(),
                repaired: entry.repaired(),
            })
            .collect(),
    };
    render(ctx.output, &view, render_show_human)
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn render_show_human(view: &ShowRecord<'_>, w: &mut dyn Write) -> io::Result<()> {
    let record = view.record;
    let pr = record.pr_state();

    section(w, &format!("Record {}", view.id))?;
    field(w, "url", &pr.url)?;
    field(w, "status", pr.status_label())?;
    field(w, "opened", timestamp(pr.created_at))?;
    if let Some(closed) = pr.closed_or_merged_at() {
        field(w, "closed", timestamp(closed))?;
    }
    field(
        w,
        "final diff",
        if record.is_finalized() {
            "captured"
        } else {
            "pending"
        },
    )?;
    field(w, "created", timestamp(record.record_metadata().created_at()))?;
    field(
        w,
        "modified",
        timestamp(record.record_metadata().last_modified()),
    )?;

    if !view.repairs.is_empty() {
        writeln!(w)?;
        section(w, &format!("Repairs ({})", view.repairs.len()))?;
        for line in &view.repairs {
            writeln!(
                w,
                "rule {:<8} found {:<6} repaired {}",
                line.rule_key, line.found, line.repaired
            )?;
        }
    }

    let edits = record.manual_edits();
    if !edits.is_empty() {
        writeln!(w)?;
        section(w, &format!("Manual edits ({})", edits.len()))?;
        for (i, edit) in edits.iter().enumerate() {
            writeln!(w, "[{}] {}: {}", i + 1, edit.edit_type.describe(), edit.reason)?;
        }
    }
    rule(w)
}
