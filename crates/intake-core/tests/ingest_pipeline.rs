use intake_core::ingest::ingest_event;
use intake_core::model::ExtractionMethod;
use intake_core::validate::{resolve_envelope, validate_record};
use serde_json::{json, Value};

fn event_with_body(body: &str) -> Value {
    json!({
        "issue": {
            "number": 12,
            "html_url": "https://example.test/i/12",
            "title": "forgecli run 1 results",
            "user": {"login": "runner-bot"},
            "created_at": "2025-03-02T12:00:00Z",
            "body": body
        }
    })
}

#[test]
fn fenced_block_is_preferred_over_decorative_braces() {
    let body = "Summary {} below.\n\n```json\n{\"schema_version\": \"3.0\", \"result_data\": {}}\n```\n";
    let report = ingest_event(&event_with_body(body));
    assert!(report.success);
    assert_eq!(report.extraction.method, ExtractionMethod::CodeBlock);
    assert_eq!(
        report.result_data.unwrap()["schema_version"],
        json!("3.0")
    );
}

#[test]
fn bare_json_in_prose_is_extracted_by_the_balanced_scan() {
    let body = "Results attached: {\"schema_version\": \"3.0\", \"result_data\": {\"note\": \"{braces} in text\"}} cheers";
    let report = ingest_event(&event_with_body(body));
    assert!(report.success);
    assert_eq!(report.extraction.method, ExtractionMethod::BalancedBraces);
    let record = report.result_data.unwrap();
    assert_eq!(
        record["result_data"]["note"],
        json!("{braces} in text")
    );
}

#[test]
fn outer_candidate_wins_when_both_nested_candidates_balance() {
    let body = "data: {\"wrapper\": {\"inner\": true}}";
    let report = ingest_event(&event_with_body(body));
    assert!(report.success);
    let record = report.result_data.unwrap();
    assert!(record.get("wrapper").is_some(), "outer object expected, got {}", record);
}

#[test]
fn unparseable_fenced_payload_reports_syntax_location() {
    let body = "```json\n{\n  \"schema_version\": \"3.0\",\n  \"trailing\": ,\n}\n```";
    let report = ingest_event(&event_with_body(body));
    assert!(!report.success);
    assert!(report.extraction.success);
    assert!(!report.validation.valid);
    let err = report.validation.error.expect("syntax error with location");
    assert!(err.line >= 1 && err.column >= 1);
    assert!(report.error.unwrap().contains("JSON validation failed"));
}

#[test]
fn body_without_any_payload_fails_extraction() {
    let report = ingest_event(&event_with_body("only prose, nothing structured"));
    assert!(!report.success);
    assert_eq!(report.extraction.method, ExtractionMethod::None);
    assert!(!report.extraction.success);
    assert!(report
        .error
        .unwrap()
        .contains("Failed to extract JSON from issue body"));
}

#[test]
fn ingest_report_feeds_straight_into_the_validator() {
    let body = "```json\n{\"schema_version\": \"3.0\", \"result_data\": {}}\n```";
    let report = ingest_event(&event_with_body(body));
    assert!(report.success);
    assert_eq!(report.issue_metadata.issue_number, Some(12));

    // The serialized report is the wire format between the two stages.
    let wire = serde_json::to_value(&report).unwrap();
    let envelope = resolve_envelope(&wire);
    let validation = validate_record(envelope, None);
    // Still invalid (sections missing), but the record reached the validator
    // and every category got its say.
    assert!(!validation.valid);
    assert!(validation
        .errors_by_category
        .required_fields
        .iter()
        .any(|d| d.field_path == "result_data.run_identity"));
}
