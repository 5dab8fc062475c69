//! `prledger report`: render the ledger as a Markdown achievements page.

use super::Context;
use crate::output::{Diagnostic, render, render_error};
use anyhow::Result;
use clap::Args;
use prledger_core::error::{ErrorCode, LedgerError};
use prledger_core::report::write_report;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Ledger file to read.
    #[arg(short = 'p', long, value_name = "PATH")]
    pub prs_json_file: PathBuf,

    /// Markdown file to write; overwritten if it exists.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Debug, Serialize)]
struct ReportOutcome {
    ledger: String,
    output: String,
    pull_requests: usize,
}

/// Execute `prledger report`. Read-only with respect to the ledger.
///
/// # Errors
///
/// Returns an error if the ledger is missing or malformed, or the output
/// file cannot be written.
pub fn run_report(args: &ReportArgs, ctx: &Context<'_>) -> Result<()> {
    let pull_requests = match write_report(&args.prs_json_file, &args.output) {
        Ok(count) => count,
        Err(err) => {
            render_error(ctx.output, &describe(&err))?;
            return Err(err);
        }
    };

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    let outcome = ReportOutcome {
        ledger: args.prs_json_file.display().to_string(),
        output: args.output.display().to_string(),
        pull_requests,
    };
    render(ctx.output, &outcome, |o, w| {
        writeln!(
            w,
            "✓ wrote {} ({} pull requests from {})",
            o.output, o.pull_requests, o.ledger
        )
    })
}

/// Keep the full context chain as the message, but take code and hint from
/// the underlying ledger error when there is one.
fn describe(err: &anyhow::Error) -> Diagnostic {
    let diagnostic = Diagnostic::new(format!("{err:#}"));
    match err.downcast_ref::<LedgerError>() {
        Some(ledger_err) => diagnostic.coded(ledger_err.code()),
        None => diagnostic
            .suggest("check --prs-json-file and --output")
            .coded(ErrorCode::StoreReadFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::describe;
    use anyhow::Context as _;
    use prledger_core::error::LedgerError;

    #[test]
    fn ledger_errors_keep_their_code_under_context() {
        let err = Err::<(), _>(LedgerError::MalformedStatistics {
            reason: "repairs[0].ruleKey must be a numeric rule id".into(),
        })
        .context("failed to render report for prs.json")
        .unwrap_err();

        let cli = describe(&err);
        assert_eq!(cli.code, Some("E2004"));
        assert!(cli.message.starts_with("failed to render report for prs.json: "));
    }

    #[test]
    fn other_errors_point_at_the_paths() {
        let cli = describe(&anyhow::anyhow!("ledger missing.json does not exist"));
        assert_eq!(cli.code, Some("E3001"));
        assert!(cli.suggestion.is_some_and(|s| s.contains("--prs-json-file")));
    }
}
