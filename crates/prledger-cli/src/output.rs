//! Human and JSON rendering for every command.
//!
//! Results go to stdout and diagnostics to stderr. In JSON mode each is a
//! single pretty-printed document; diagnostics are wrapped as
//! `{"error": {...}}` so callers can tell the two apart.

use prledger_core::error::{ErrorCode, LedgerError};
use serde::Serialize;
use std::io::{self, Write};

const RULE: &str = "────────────────────────────────────────────────────────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Title line followed by a rule.
pub fn section(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}\n{RULE}")
}

pub fn field(w: &mut dyn Write, label: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "  {label:<12} {}", value.as_ref())
}

pub fn rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{RULE}")
}

/// What a failed command tells the operator.
#[derive(Debug, Serialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(rename = "error_code", skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            code: None,
        }
    }

    #[must_use]
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach `code`, taking its stock hint unless a suggestion is already set.
    #[must_use]
    pub fn coded(mut self, code: ErrorCode) -> Self {
        self.code = Some(code.code());
        if self.suggestion.is_none() {
            self.suggestion = code.hint().map(str::to_string);
        }
        self
    }
}

impl From<&LedgerError> for Diagnostic {
    fn from(err: &LedgerError) -> Self {
        Self::new(err.to_string()).coded(err.code())
    }
}

/// Print a command result on stdout; `human` writes the text form.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    write_value(&mut io::stdout().lock(), mode, value, human)
}

/// Print a diagnostic on stderr.
pub fn render_error(mode: OutputMode, diagnostic: &Diagnostic) -> anyhow::Result<()> {
    write_error(&mut io::stderr().lock(), mode, diagnostic)
}

/// JSON diagnostics read `{"error": {...}}`.
#[derive(Serialize)]
struct Wrapped<'a> {
    error: &'a Diagnostic,
}

fn write_error(
    out: &mut dyn Write,
    mode: OutputMode,
    diagnostic: &Diagnostic,
) -> anyhow::Result<()> {
    write_value(out, mode, &Wrapped { error: diagnostic }, |wrapped, w| {
        writeln!(w, "error: {}", wrapped.error.message)?;
        match &wrapped.error.suggestion {
            Some(suggestion) => writeln!(w, "  suggestion: {suggestion}"),
            None => Ok(()),
        }
    })
}

fn write_value<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
    } else {
        human(value, out)?;
    }
    Ok(())
}
