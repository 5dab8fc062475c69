#![forbid(unsafe_code)]

mod cmd;
mod github;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::{env, io};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "prledger: a ledger of automated-repair pull requests",
    long_about = None
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// GitHub API token. Falls back to GITHUB_TOKEN, then config.
    #[arg(long, global = true, value_name = "TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Record a newly opened repair PR",
        long_about = "Fetch the PR from GitHub and store its state, initial diff and repair statistics.",
        after_help = "EXAMPLES:\n    # Capture PR #42 with the statistics from the repair run\n    prledger create-initial -o acme -r widget -p 42 -s stats.json\n\n    # Use a ledger other than prs.json\n    prledger create-initial -o acme -r widget -p 42 -f ledger/prs.json"
    )]
    CreateInitial(cmd::create_initial::CreateInitialArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Record the final state of a PR",
        long_about = "Fetch the merged or closed PR from GitHub and store its final state and diff.",
        after_help = "EXAMPLES:\n    # Capture the merged state of PR #42\n    prledger finalize -o acme -r widget -p 42\n\n    # Emit machine-readable output\n    prledger finalize -o acme -r widget -p 42 --json"
    )]
    Finalize(cmd::finalize::FinalizeArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Attach a manual edit to a PR record",
        long_about = "Append a human-made diff, with its reason, to an existing record.",
        after_help = "EXAMPLES:\n    # Record an edit made after the PR was opened\n    prledger add-manual-edit -o acme -r widget -p 42 -d edit.diff -e \"keep API stable\"\n\n    # Record an edit made before opening\n    prledger add-manual-edit -o acme -r widget -p 42 -d edit.diff -e \"fix import\" -t before_open_pr"
    )]
    AddManualEdit(cmd::add_manual_edit::AddManualEditArgs),

    #[command(
        next_help_heading = "Read",
        about = "Render the ledger as Markdown",
        long_about = "Write an achievements page listing every recorded PR and its repairs.",
        after_help = "EXAMPLES:\n    # Write the achievements page\n    prledger report -p prs.json -o ACHIEVEMENTS.md"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one PR record",
        long_about = "Show the stored state, repairs and manual edits of one record.",
        after_help = "EXAMPLES:\n    # Show a record\n    prledger show -o acme -r widget -p 42\n\n    # Dump the stored record as JSON\n    prledger show -o acme -r widget -p 42 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    prledger completions bash\n\n    # Generate zsh completions\n    prledger completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Logs go to stderr so stdout stays parseable under `--json`.
fn init_tracing(verbose: bool) {
    let default_directives = if verbose || env::var_os("DEBUG").is_some() {
        "prledger=debug,prledger_core=debug,info"
    } else {
        "prledger=info,prledger_core=info,warn"
    };
    let filter = EnvFilter::try_from_env("PRLEDGER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    let json = env::var("PRLEDGER_LOG_FORMAT").is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let ctx = cmd::Context {
        project_root: &project_root,
        output: cli.output_mode(),
        quiet: cli.quiet,
        token: cli.token.as_deref(),
    };
    debug!(root = %project_root.display(), "starting prledger");

    match &cli.command {
        Commands::CreateInitial(args) => cmd::create_initial::run_create_initial(args, &ctx),
        Commands::Finalize(args) => cmd::finalize::run_finalize(args, &ctx),
        Commands::AddManualEdit(args) => cmd::add_manual_edit::run_add_manual_edit(args, &ctx),
        Commands::Report(args) => cmd::report::run_report(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_initial_parses_short_flags() {
        let cli = Cli::parse_from([
            "prledger",
            "create-initial",
            "-o",
            "acme",
            "-r",
            "widget",
            "-p",
            "42",
            "-f",
            "ledger.json",
            "-s",
            "stats.json",
        ]);
        let Commands::CreateInitial(args) = cli.command else {
            panic!("expected create-initial");
        };
        assert_eq!(args.pr.owner, "acme");
        assert_eq!(args.pr.repo_name, "widget");
        assert_eq!(args.pr.pr_number, 42);
        assert_eq!(args.pr.prs_json_file.as_deref(), Some("ledger.json".as_ref()));
        assert_eq!(args.stats_file.as_deref(), Some("stats.json".as_ref()));
    }

    #[test]
    fn add_manual_edit_defaults_to_after_open_pr() {
        let cli = Cli::parse_from([
            "prledger",
            "add-manual-edit",
            "--owner",
            "acme",
            "--repo-name",
            "widget",
            "--pr-number",
            "42",
            "--diff-file",
            "edit.diff",
            "--edit-reason",
            "keep API stable",
        ]);
        let Commands::AddManualEdit(args) = cli.command else {
            panic!("expected add-manual-edit");
        };
        assert_eq!(args.edit_type, "after_open_pr");
        assert_eq!(args.edit_reason, "keep API stable");
    }

    #[test]
    fn report_takes_ledger_and_output() {
        let cli = Cli::parse_from(["prledger", "report", "-p", "prs.json", "-o", "OUT.md"]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.prs_json_file, std::path::PathBuf::from("prs.json"));
        assert_eq!(args.output, std::path::PathBuf::from("OUT.md"));
    }

    #[test]
    fn pr_number_must_be_numeric() {
        let result = Cli::try_parse_from([
            "prledger", "finalize", "-o", "acme", "-r", "widget", "-p", "forty-two",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from([
            "prledger", "show", "-o", "acme", "-r", "widget", "-p", "1", "--json",
        ]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::parse_from([
            "prledger", "-v", "-q", "--token", "t0ken", "report", "-p", "a.json", "-o", "b.md",
        ]);
        assert!(cli.verbose);
        assert!(cli.quiet);
        assert_eq!(cli.token.as_deref(), Some("t0ken"));
        assert!(!cli.output_mode().is_json());
    }
}
