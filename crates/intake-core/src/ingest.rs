//! Ingestion stage: event payload in, structured report out.
//!
//! Pulls the issue body and metadata out of an event payload, runs the
//! extractor, then syntax-validates the candidate. The report is the wire
//! format consumed by the validation stage.

use crate::extract::{extract_payload, Extraction};
use crate::model::{ExtractionMethod, IssueMetadata, SyntaxError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub method: ExtractionMethod,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SyntaxError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub success: bool,
    pub issue_metadata: IssueMetadata,
    pub extraction: ExtractionOutcome,
    pub validation: SyntaxCheck,
    /// The parsed record envelope, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lift issue metadata out of an event payload.
pub fn issue_metadata(event: &Value) -> IssueMetadata {
    let issue = event.get("issue");
    let get = |key: &str| {
        issue
            .and_then(|i| i.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    IssueMetadata {
        issue_number: issue.and_then(|i| i.get("number")).and_then(Value::as_i64),
        issue_url: get("html_url"),
        issue_title: get("title"),
        submitter: issue
            .and_then(|i| i.get("user"))
            .and_then(|u| u.get("login"))
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: get("created_at"),
    }
}

/// Run extraction + syntax validation for a full event payload.
pub fn ingest_event(event: &Value) -> IngestReport {
    let metadata = issue_metadata(event);
    let body = event
        .get("issue")
        .and_then(|i| i.get("body"))
        .and_then(Value::as_str)
        .unwrap_or("");
    ingest_body(body, metadata)
}

/// Run extraction + syntax validation for a raw body.
pub fn ingest_body(body: &str, metadata: IssueMetadata) -> IngestReport {
    let Extraction { payload, method } = extract_payload(body);

    let Some(payload) = payload else {
        return IngestReport {
            success: false,
            issue_metadata: metadata,
            extraction: ExtractionOutcome {
                method,
                success: false,
            },
            validation: SyntaxCheck {
                valid: false,
                error: None,
            },
            result_data: None,
            error: Some(format!(
                "Failed to extract JSON from issue body. Extraction method attempted: {}",
                method.as_str()
            )),
        };
    };

    match parse_payload(&payload) {
        Ok(record) => IngestReport {
            success: true,
            issue_metadata: metadata,
            extraction: ExtractionOutcome {
                method,
                success: true,
            },
            validation: SyntaxCheck {
                valid: true,
                error: None,
            },
            result_data: Some(record),
            error: None,
        },
        Err(err) => {
            let message = err.to_string();
            IngestReport {
                success: false,
                issue_metadata: metadata,
                extraction: ExtractionOutcome {
                    method,
                    success: true,
                },
                validation: SyntaxCheck {
                    valid: false,
                    error: Some(err),
                },
                result_data: None,
                error: Some(format!("JSON validation failed: {}", message)),
            }
        }
    }
}

/// Syntax-validate an extracted candidate, reporting the parser's location
/// on failure.
pub fn parse_payload(payload: &str) -> Result<Value, SyntaxError> {
    if payload.trim().is_empty() {
        return Err(SyntaxError {
            line: 1,
            column: 1,
            message: "Extracted content is empty".to_string(),
        });
    }
    serde_json::from_str(payload).map_err(|e| SyntaxError {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })
}
