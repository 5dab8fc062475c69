pub mod add_manual_edit;
pub mod completions;
pub mod create_initial;
pub mod finalize;
pub mod report;
pub mod show;

use crate::output::{Diagnostic, OutputMode, render, render_error};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use prledger_core::config::{self, CliOverrides, EffectiveConfig};
use prledger_core::error::{ErrorCode, LedgerError};
use prledger_core::ledger::LedgerFile;
use prledger_core::lifecycle::Operation;
use prledger_core::model::{PrRecord, RecordId};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Flags shared by every command that addresses one pull request.
#[derive(Args, Debug, Clone)]
pub struct PrArgs {
    /// Owner of the repository the PR was opened against.
    #[arg(short, long)]
    pub owner: String,

    /// Name of the repository.
    #[arg(short = 'r', long)]
    pub repo_name: String,

    /// Pull request number.
    #[arg(short = 'p', long)]
    pub pr_number: u64,

    /// Ledger file. Defaults to `ledger_path` from config, then `prs.json`.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub prs_json_file: Option<PathBuf>,
}

/// Global state every command handler receives.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub project_root: &'a Path,
    pub output: OutputMode,
    pub quiet: bool,
    pub token: Option<&'a str>,
}

impl Context<'_> {
    /// Resolve config with `ledger_path` as the command-line override.
    pub fn resolve_config(&self, ledger_path: Option<&Path>) -> Result<EffectiveConfig> {
        let overrides = CliOverrides {
            ledger_path: ledger_path.map(Path::to_path_buf),
            token: self.token.map(str::to_string),
        };
        match config::resolve_config(self.project_root, &overrides) {
            Ok(config) => Ok(config),
            Err(err) => {
                let diagnostic =
                    Diagnostic::new(format!("{err:#}")).coded(ErrorCode::ConfigParseError);
                render_error(self.output, &diagnostic)?;
                Err(err)
            }
        }
    }
}

/// Surface a ledger error as a diagnostic, then fail the command with it.
pub fn check<T>(output: OutputMode, result: Result<T, LedgerError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            render_error(output, &Diagnostic::from(&err))?;
            Err(err.into())
        }
    }
}

pub fn record_id(output: OutputMode, args: &PrArgs) -> Result<RecordId> {
    check(
        output,
        RecordId::from_parts(&args.owner, &args.repo_name, args.pr_number),
    )
}

pub fn open_ledger(output: OutputMode, config: &EffectiveConfig) -> Result<LedgerFile> {
    check(
        output,
        LedgerFile::open(&config.ledger_path, config.lock_timeout),
    )
}

/// Read a user-supplied input file, reporting failures as diagnostics.
pub fn read_input(output: OutputMode, path: &Path, what: &str) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(raw),
        Err(err) => {
            let message = format!("failed to read {what} {}: {err}", path.display());
            let diagnostic = Diagnostic::new(message.clone())
                .suggest(format!("check the {what} path"))
                .coded(ErrorCode::StoreReadFailed);
            render_error(output, &diagnostic)?;
            anyhow::bail!(message)
        }
    }
}

/// Result of one mutating command.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub operation: String,
    pub record: String,
    pub ledger: String,
    pub finalized: bool,
    pub manual_edits: usize,
    pub last_modified: DateTime<Utc>,
    #[serde(skip)]
    summary: String,
}

impl Outcome {
    pub fn new(operation: Operation, id: &RecordId, ledger: &Path, record: &PrRecord) -> Self {
        let manual_edits = record.manual_edits().len();
        let summary = match operation {
            Operation::CreateInitial => format!("created initial record {id}"),
            Operation::Finalize => format!("finalized record {id}"),
            Operation::AddManualEdit => format!("added manual edit #{manual_edits} to {id}"),
        };
        Self {
            operation: operation.to_string(),
            record: id.to_string(),
            ledger: ledger.display().to_string(),
            finalized: record.is_finalized(),
            manual_edits,
            last_modified: record.record_metadata().last_modified(),
            summary,
        }
    }
}

/// Print the outcome unless `--quiet` was given without `--json`.
pub fn emit_outcome(ctx: &Context<'_>, outcome: &Outcome) -> Result<()> {
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render(ctx.output, outcome, |o, w| {
        writeln!(w, "✓ {} in {}", o.summary, o.ledger)
    })
}
