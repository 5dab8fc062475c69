use std::fmt;
use std::path::PathBuf;

use crate::lock::LockError;
use crate::model::RecordId;

/// Machine-readable error codes for scripts that drive the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidRecordId,
    InvalidEditType,
    InvalidManualEdit,
    DuplicateRecord,
    MissingInitialRecord,
    RecordNotFound,
    MalformedStatistics,
    StoreReadFailed,
    CorruptStore,
    StoreWriteFailed,
    LockContention,
    UpstreamFetchFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidRecordId => "E1002",
            Self::InvalidEditType => "E1003",
            Self::InvalidManualEdit => "E1004",
            Self::DuplicateRecord => "E2001",
            Self::MissingInitialRecord => "E2002",
            Self::RecordNotFound => "E2003",
            Self::MalformedStatistics => "E2004",
            Self::StoreReadFailed => "E3001",
            Self::CorruptStore => "E3002",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::UpstreamFetchFailure => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidRecordId => "Invalid record identifier",
            Self::InvalidEditType => "Invalid manual edit type",
            Self::InvalidManualEdit => "Invalid manual edit",
            Self::DuplicateRecord => "Record already exists",
            Self::MissingInitialRecord => "Initial record missing",
            Self::RecordNotFound => "Record not found",
            Self::MalformedStatistics => "Malformed repair statistics",
            Self::StoreReadFailed => "Ledger read failed",
            Self::CorruptStore => "Corrupt ledger file",
            Self::StoreWriteFailed => "Ledger write failed",
            Self::LockContention => "Lock contention",
            Self::UpstreamFetchFailure => "Upstream fetch failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in prledger.toml and retry."),
            Self::InvalidRecordId => Some("Use an identifier of the form owner/repo#number."),
            Self::InvalidEditType => Some("Use one of: before_open_pr, after_open_pr."),
            Self::InvalidManualEdit => Some("Provide a short, non-empty --edit-reason."),
            Self::DuplicateRecord => {
                Some("Use `finalize` or `add-manual-edit` to update an existing record.")
            }
            Self::MissingInitialRecord => {
                Some("Run `create-initial` for this record first.")
            }
            Self::RecordNotFound => Some("Check owner, repo name and PR number."),
            Self::MalformedStatistics => {
                Some("Pass the statistics file produced by the repair tool unmodified.")
            }
            Self::StoreReadFailed => Some("Check that the ledger path is readable."),
            Self::CorruptStore => Some("Restore the ledger from version control."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `prledger` process releases its lock.")
            }
            Self::UpstreamFetchFailure => {
                Some("Check network access and GITHUB_TOKEN, then retry.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Everything that can go wrong while reading, mutating or writing the ledger.
///
/// Every variant is raised before the store is mutated, so a failed operation
/// never leaves a half-written ledger behind.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid record identifier '{value}': {reason}")]
    InvalidRecordId { value: String, reason: &'static str },

    #[error("invalid edit type '{0}'")]
    InvalidEditType(String),

    #[error("invalid manual edit for {id}: {reason}")]
    InvalidManualEdit { id: RecordId, reason: &'static str },

    #[error("cannot create initial record for {id}: already exists")]
    DuplicateRecord { id: RecordId },

    #[error("cannot create final record for {id}: initial record does not exist")]
    MissingInitialRecord { id: RecordId },

    #[error("no such record: {id}")]
    RecordNotFound { id: RecordId },

    #[error("malformed repair statistics: {reason}")]
    MalformedStatistics { reason: String },

    #[error("failed to fetch {what} for {id}: {message}")]
    UpstreamFetchFailure {
        id: RecordId,
        what: &'static str,
        message: String,
    },

    #[error("failed to read ledger {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ledger {path}: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write ledger {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl LedgerError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRecordId { .. } => ErrorCode::InvalidRecordId,
            Self::InvalidEditType(_) => ErrorCode::InvalidEditType,
            Self::InvalidManualEdit { .. } => ErrorCode::InvalidManualEdit,
            Self::DuplicateRecord { .. } => ErrorCode::DuplicateRecord,
            Self::MissingInitialRecord { .. } => ErrorCode::MissingInitialRecord,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::MalformedStatistics { .. } => ErrorCode::MalformedStatistics,
            Self::UpstreamFetchFailure { .. } => ErrorCode::UpstreamFetchFailure,
            Self::StoreRead { .. } => ErrorCode::StoreReadFailed,
            Self::StoreParse { .. } => ErrorCode::CorruptStore,
            Self::StoreWrite { .. } => ErrorCode::StoreWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }

    /// Remediation hint for the operator, if one applies.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
