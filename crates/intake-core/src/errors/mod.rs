pub mod defect;

pub use defect::{codes, Defect, DefectCategory};

use serde::Serialize;

/// Failure taxonomy of the partitioned store. Serialized alongside the stage
/// report so orchestrators can branch on `kind` without parsing messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreError {
    /// A field the store needs (run_id or the submission timestamp) is absent
    /// from a record that should have been validated upstream.
    MissingField { field_path: String },
    /// The submission timestamp could not be parsed as an absolute instant.
    TimestampUnparseable { timestamp: String, detail: String },
    /// An already-stored record with the same run_id is strictly newer; the
    /// incoming record is discarded and the store is left untouched.
    StaleSubmission {
        run_id: String,
        incoming_timestamp: String,
        existing_timestamp: String,
        existing_file: String,
    },
    /// Filesystem failure while committing the write. The partition tree is
    /// left in its pre-write state.
    StorageIo { path: String, detail: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::MissingField { field_path } => {
                write!(f, "missing required field in validated data: {}", field_path)
            }
            StoreError::TimestampUnparseable { timestamp, detail } => {
                write!(
                    f,
                    "invalid timestamp format: {}. Expected ISO-8601 (YYYY-MM-DDTHH:MM:SS[.SSS]Z): {}",
                    timestamp, detail
                )
            }
            StoreError::StaleSubmission {
                run_id,
                existing_timestamp,
                ..
            } => {
                write!(
                    f,
                    "submission timestamp is not newer than existing file(s) with run_id {} (latest existing: {})",
                    run_id, existing_timestamp
                )
            }
            StoreError::StorageIo { path, detail } => {
                write!(f, "storage I/O error at {}: {}", path, detail)
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::StoreError;

    #[test]
    fn store_error_serializes_tagged_kind() {
        let err = StoreError::StaleSubmission {
            run_id: "tool_A_x".into(),
            incoming_timestamp: "2025-01-01T00:00:00Z".into(),
            existing_timestamp: "2025-02-01T00:00:00Z".into(),
            existing_file: "submissions/2025/02/tool_A_x.json".into(),
        };
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["kind"], "stale_submission");
        assert_eq!(v["run_id"], "tool_A_x");
    }
}
