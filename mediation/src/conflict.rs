//! Pairwise conflict detection between two xApps' recent decisions.

use serde::Serialize;

use crate::ledger::DecisionRecord;

/// A contradictory pair of decisions: same target and parameter, different
/// values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub first: DecisionRecord,
    pub second: DecisionRecord,
}

impl Conflict {
    /// One-line description for the mediation log.
    pub fn describe(&self) -> String {
        format!(
            "conflict for {} {} on parameter {}: values {} and {}",
            self.first.target_type,
            self.first.target_id,
            self.first.parameter_name,
            self.first.parameter_value,
            self.second.parameter_value,
        )
    }
}

/// Compare every decision from the first xApp against every decision from the
/// second.
///
/// A conflict is declared iff `target_type`, `target_id` and `parameter_name`
/// all match and `parameter_value` differs. Every conflicting pair is
/// reported; nothing is deduplicated. Window sizes are a few seconds of
/// history, so the O(n*m) sweep is fine.
pub fn detect_conflicts(first: &[DecisionRecord], second: &[DecisionRecord]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for d1 in first {
        for d2 in second {
            if d1.target_type == d2.target_type
                && d1.target_id == d2.target_id
                && d1.parameter_name == d2.parameter_name
                && d1.parameter_value != d2.parameter_value
            {
                conflicts.push(Conflict {
                    first: d1.clone(),
                    second: d2.clone(),
                });
            }
        }
    }
    conflicts
}
