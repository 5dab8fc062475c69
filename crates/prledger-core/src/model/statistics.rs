//! Repair statistics emitted by the repair tool.
//!
//! The payload is kept verbatim so the ledger preserves whatever the tool
//! reported, but it is checked once at capture time so that the renderer can
//! rely on the `repairs` entries being well formed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LedgerError;

pub const REPAIRS_KEY: &str = "repairs";
pub const RULE_KEY: &str = "ruleKey";
pub const VIOLATIONS_BEFORE_KEY: &str = "nbViolationsBefore";
pub const VIOLATIONS_AFTER_KEY: &str = "nbViolationsAfter";

/// Verbatim statistics object, captured once at initial-record time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepairStatistics(Map<String, Value>);

/// One per-rule line of the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairEntry {
    pub rule_key: u64,
    pub violations_before: u64,
    pub violations_after: u64,
}

impl RepairEntry {
    /// Violations present before the repair tool ran.
    #[must_use]
    pub const fn found(&self) -> u64 {
        self.violations_before
    }

    /// Violations the tool removed.
    #[must_use]
    pub const fn repaired(&self) -> u64 {
        self.violations_before.saturating_sub(self.violations_after)
    }
}

impl RepairStatistics {
    /// Statistics for a PR captured without a statistics file.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate a raw payload and wrap it.
    ///
    /// An empty object is accepted. Anything else must carry a `repairs`
    /// array whose entries each have a numeric `ruleKey` and non-negative
    /// integer `nbViolationsBefore` / `nbViolationsAfter`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MalformedStatistics`] describing the first
    /// problem found.
    pub fn from_value(value: Value) -> Result<Self, LedgerError> {
        let Value::Object(map) = value else {
            return Err(malformed("top-level value must be a JSON object"));
        };
        let stats = Self(map);
        if !stats.0.is_empty() {
            if !stats.0.contains_key(REPAIRS_KEY) {
                return Err(malformed(format!("missing '{REPAIRS_KEY}' array")));
            }
            stats.repairs()?;
        }
        Ok(stats)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw access to the captured payload.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Parse the `repairs` entries in payload order.
    ///
    /// A payload without `repairs` yields no entries.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MalformedStatistics`] if `repairs` is not an
    /// array or an entry lacks one of the expected fields.
    pub fn repairs(&self) -> Result<Vec<RepairEntry>, LedgerError> {
        let Some(raw) = self.0.get(REPAIRS_KEY) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = raw else {
            return Err(malformed(format!("'{REPAIRS_KEY}' must be an array")));
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_entry(index, item))
            .collect()
    }
}

fn parse_entry(index: usize, item: &Value) -> Result<RepairEntry, LedgerError> {
    let Value::Object(entry) = item else {
        return Err(malformed(format!("repairs[{index}] must be an object")));
    };

    let rule_key = match entry.get(RULE_KEY) {
        Some(Value::String(raw)) => raw.trim().parse::<u64>().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    }
    .ok_or_else(|| malformed(format!("repairs[{index}].{RULE_KEY} must be a numeric rule id")))?;

    let count = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                malformed(format!(
                    "repairs[{index}].{key} must be a non-negative integer"
                ))
            })
    };

    Ok(RepairEntry {
        rule_key,
        violations_before: count(VIOLATIONS_BEFORE_KEY)?,
        violations_after: count(VIOLATIONS_AFTER_KEY)?,
    })
}

fn malformed(reason: impl Into<String>) -> LedgerError {
    LedgerError::MalformedStatistics {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{RepairEntry, RepairStatistics};
    use crate::error::LedgerError;
    use serde_json::json;

    #[test]
    fn empty_object_is_accepted() {
        let stats = RepairStatistics::from_value(json!({})).unwrap();
        assert!(stats.is_empty());
        assert!(stats.repairs().unwrap().is_empty());
    }

    #[test]
    fn parses_string_and_integer_rule_keys() {
        let stats = RepairStatistics::from_value(json!({
            "repairs": [
                {"ruleKey": "117", "nbViolationsBefore": 5, "nbViolationsAfter": 2},
                {"ruleKey": 2095, "nbViolationsBefore": 1, "nbViolationsAfter": 0}
            ]
        }))
        .unwrap();

        let repairs = stats.repairs().unwrap();
        assert_eq!(
            repairs,
            vec![
                RepairEntry {
                    rule_key: 117,
                    violations_before: 5,
                    violations_after: 2
                },
                RepairEntry {
                    rule_key: 2095,
                    violations_before: 1,
                    violations_after: 0
                },
            ]
        );
        assert_eq!(repairs[0].found(), 5);
        assert_eq!(repairs[0].repaired(), 3);
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let raw = json!({
            "repairs": [],
            "executionInfo": {"soraldVersion": "0.1.0"}
        });
        let stats = RepairStatistics::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&stats).unwrap(), raw);
    }

    #[test]
    fn repaired_never_underflows() {
        let entry = RepairEntry {
            rule_key: 1,
            violations_before: 2,
            violations_after: 4,
        };
        assert_eq!(entry.repaired(), 0);
    }

    #[test]
    fn rejects_malformed_payloads() {
        let cases = [
            json!([]),
            json!("repairs"),
            json!({"executionInfo": {}}),
            json!({"repairs": {}}),
            json!({"repairs": [1]}),
            json!({"repairs": [{"nbViolationsBefore": 1, "nbViolationsAfter": 0}]}),
            json!({"repairs": [{"ruleKey": "S117", "nbViolationsBefore": 1, "nbViolationsAfter": 0}]}),
            json!({"repairs": [{"ruleKey": "117", "nbViolationsAfter": 0}]}),
            json!({"repairs": [{"ruleKey": "117", "nbViolationsBefore": -1, "nbViolationsAfter": 0}]}),
        ];
        for case in cases {
            assert!(
                matches!(
                    RepairStatistics::from_value(case.clone()),
                    Err(LedgerError::MalformedStatistics { .. })
                ),
                "expected {case} to be rejected"
            );
        }
    }
}
