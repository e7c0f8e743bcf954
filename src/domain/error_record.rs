//! Rejected-row records for the side error log.

use serde::{Deserialize, Serialize};

use crate::error::RejectReason;

/// A legacy row that was excluded from the output, with the reason.
///
/// Never written to the document store; collected into the JSON error log
/// for manual follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// The offending row as it was read.
    pub doc: serde_json::Value,
    /// Human-readable failure reason.
    pub error: String,
}

impl ErrorRecord {
    /// Builds a record from any serializable row and a typed reason.
    ///
    /// Rows that fail to serialize are kept as `null` so the reason is
    /// never lost.
    #[must_use]
    pub fn new<T: Serialize>(doc: &T, reason: &RejectReason) -> Self {
        Self {
            doc: serde_json::to_value(doc).unwrap_or(serde_json::Value::Null),
            error: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn keeps_row_and_reason() {
        let mut row = BTreeMap::new();
        row.insert("token_id", "");
        let record = ErrorRecord::new(&row, &RejectReason::MissingField("token_id"));
        assert_eq!(record.doc, serde_json::json!({ "token_id": "" }));
        assert_eq!(record.error, "missing required field `token_id`");
    }
}
