use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::error::LedgerError;

/// Primary key of a ledger entry: `owner/repo#number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    owner: String,
    repo: String,
    number: u64,
}

impl RecordId {
    /// Build an identifier without validating its parts.
    ///
    /// Prefer [`RecordId::parse`] or [`RecordId::from_parts`] for user input.
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Build a validated identifier from its three components.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRecordId`] when the owner or repository
    /// name is empty or contains `/`, `#` or whitespace, or the number is zero.
    pub fn from_parts(owner: &str, repo: &str, number: u64) -> Result<Self, LedgerError> {
        let id = Self::new(owner, repo, number);
        validate_segment(owner, &id, "owner must not be empty")?;
        validate_segment(repo, &id, "repository name must not be empty")?;
        if number == 0 {
            return Err(invalid(&id.to_string(), "PR number must be positive"));
        }
        Ok(id)
    }

    /// Parse `owner/repo#number`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRecordId`] if the text is not of that shape.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let trimmed = raw.trim();
        let Some((slug, number)) = trimmed.rsplit_once('#') else {
            return Err(invalid(raw, "expected owner/repo#number"));
        };
        let Some((owner, repo)) = slug.split_once('/') else {
            return Err(invalid(raw, "expected owner/repo#number"));
        };
        let number = number
            .parse::<u64>()
            .map_err(|_| invalid(raw, "PR number must be a positive integer"))?;
        Self::from_parts(owner, repo, number)
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// `owner/repo`, as stored in a record's `repo_slug`.
    #[must_use]
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn validate_segment(
    segment: &str,
    id: &RecordId,
    empty_reason: &'static str,
) -> Result<(), LedgerError> {
    if segment.is_empty() {
        return Err(invalid(&id.to_string(), empty_reason));
    }
    if segment
        .chars()
        .any(|c| c == '/' || c == '#' || c.is_whitespace())
    {
        return Err(invalid(
            &id.to_string(),
            "owner and repository name must not contain '/', '#' or whitespace",
        ));
    }
    Ok(())
}

fn invalid(value: &str, reason: &'static str) -> LedgerError {
    LedgerError::InvalidRecordId {
        value: value.to_string(),
        reason,
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

impl FromStr for RecordId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
