//! Rubric-based risk identification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Rubric;

/// Criterion id handled by the missing-signature heuristic.
pub const MISSING_INFO_ID: &str = "missing_info";

const MISSING_SIGNATURE_REASON: &str = "Potential missing signature.";

/// A risk raised by a rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    /// Criterion id.
    pub id: String,
    /// The criterion's configured risk level (`null` if unset).
    pub level: Value,
    /// Why the risk was raised.
    pub reason: String,
}

/// Evaluates `rubric` against document `text`.
///
/// Only the `missing_info` criterion has a heuristic: it fires when the
/// text does not mention "signature" (case-insensitive). Criteria with any
/// other id are not evaluated.
#[must_use]
pub fn identify_risks(text: &str, rubric: &Rubric) -> Vec<RiskFinding> {
    let lowered = text.to_lowercase();

    rubric
        .criteria
        .iter()
        .filter_map(|criterion| {
            let id = criterion.id.as_deref()?;
            // TODO: evaluate description keywords once rubrics carry per-criterion rules.
            (id == MISSING_INFO_ID && !lowered.contains("signature")).then(|| RiskFinding {
                id: id.to_string(),
                level: criterion.risk_level.clone().unwrap_or(Value::Null),
                reason: MISSING_SIGNATURE_REASON.to_string(),
            })
        })
        .collect()
}
