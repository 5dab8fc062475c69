use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `prledger completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to stdout.
///
/// # Errors
///
/// Returns an error if the script cannot be written.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    generate(shell, command, "prledger", &mut out);
    Ok(())
}
