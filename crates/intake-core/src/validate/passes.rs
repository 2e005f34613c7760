//! The five independent validation passes.
//!
//! Each pass is a pure function from the record envelope to a list of
//! defects. Passes never short-circuit one another: a record missing a whole
//! section still gets type, enum, format, and range checks on whatever
//! partial structure remains reachable.

use crate::errors::{codes, Defect, DefectCategory};
use crate::record::{get_array, get_object, get_path, is_number, type_name};
use crate::timestamp;
use serde_json::Value;

const RUN_IDENTITY_FIELDS: [&str; 9] = [
    "tool_name",
    "tool_version",
    "run_id",
    "run_number",
    "target_model",
    "api_style",
    "spec_reference",
    "workspace_path",
    "run_environment",
];

const GENERATION_METRIC_FIELDS: [&str; 7] = [
    "llm_model",
    "start_timestamp",
    "end_timestamp",
    "duration_minutes",
    "clarifications_count",
    "interventions_count",
    "reruns_count",
];

const ACCEPTANCE_FIELDS: [&str; 4] = ["pass_count", "fail_count", "not_run_count", "passrate"];

const SCORE_FIELDS: [&str; 7] = [
    "correctness_C",
    "reproducibility_R",
    "determinism_D",
    "effort_E",
    "speed_S",
    "contract_docs_K",
    "overall_score",
];

/// Presence of root fields, the identity section, at least one
/// implementation, per-implementation required sub-sections, and the
/// submission section.
pub fn required_fields(envelope: &Value) -> Vec<Defect> {
    let mut defects = Vec::new();

    let root = envelope.as_object();
    let present = |key: &str| {
        root.map(|o| crate::record::is_present(o, key))
            .unwrap_or(false)
    };

    if !present("schema_version") {
        defects.push(Defect::missing_field("schema_version", "schema_version"));
    }
    if !present("result_data") {
        defects.push(Defect::missing_field("result_data", "result_data"));
        return defects;
    }

    match get_object(envelope, "result_data.run_identity") {
        None => defects.push(Defect::missing_section(
            "result_data.run_identity",
            "run_identity",
        )),
        Some(identity) => {
            for field in RUN_IDENTITY_FIELDS {
                if !crate::record::is_present(identity, field) {
                    defects.push(Defect::missing_field(
                        format!("result_data.run_identity.{}", field),
                        field,
                    ));
                }
            }
        }
    }

    match get_object(envelope, "result_data.implementations") {
        None => defects.push(Defect::missing_section(
            "result_data.implementations",
            "implementations",
        )),
        Some(impls) => {
            if !impls.contains_key("api") && !impls.contains_key("ui") {
                defects.push(
                    Defect::new(
                        DefectCategory::Required,
                        "result_data.implementations",
                        "At least one of 'api' or 'ui' must be present",
                    )
                    .with_code(codes::REQUIRED_IMPLEMENTATION_MISSING),
                );
            }
            if impls.contains_key("api") {
                required_implementation(
                    envelope,
                    &mut defects,
                    "api",
                    &["contract_artifact_path", "run_instructions_path"],
                );
            }
            if impls.contains_key("ui") {
                required_implementation(
                    envelope,
                    &mut defects,
                    "ui",
                    &["ui_source_path", "ui_run_summary_path"],
                );
                let ui_path = "result_data.implementations.ui";
                let build_present = get_object(envelope, ui_path)
                    .map(|ui| crate::record::is_present(ui, "build_success"))
                    .unwrap_or(false);
                if !build_present {
                    defects.push(Defect::missing_field(
                        format!("{}.build_success", ui_path),
                        "build_success",
                    ));
                }
            }
        }
    }

    match get_object(envelope, "result_data.submission") {
        None => defects.push(Defect::missing_section(
            "result_data.submission",
            "submission",
        )),
        Some(submission) => {
            for field in ["submitted_timestamp", "submitted_by", "submission_method"] {
                if !crate::record::is_present(submission, field) {
                    defects.push(Defect::missing_field(
                        format!("result_data.submission.{}", field),
                        field,
                    ));
                }
            }
        }
    }

    defects
}

fn required_implementation(
    envelope: &Value,
    defects: &mut Vec<Defect>,
    kind: &str,
    artifact_fields: &[&str],
) {
    let base = format!("result_data.implementations.{}", kind);

    match get_object(envelope, &format!("{}.generation_metrics", base)) {
        None => defects.push(Defect::missing_section(
            format!("{}.generation_metrics", base),
            "generation_metrics",
        )),
        Some(metrics) => {
            for field in GENERATION_METRIC_FIELDS {
                if !crate::record::is_present(metrics, field) {
                    defects.push(Defect::missing_field(
                        format!("{}.generation_metrics.{}", base, field),
                        field,
                    ));
                }
            }
        }
    }

    if kind == "api" {
        match get_object(envelope, &format!("{}.acceptance", base)) {
            None => defects.push(Defect::missing_section(
                format!("{}.acceptance", base),
                "acceptance",
            )),
            Some(acceptance) => {
                for field in ACCEPTANCE_FIELDS {
                    if !crate::record::is_present(acceptance, field) {
                        defects.push(Defect::missing_field(
                            format!("{}.acceptance.{}", base, field),
                            field,
                        ));
                    }
                }
            }
        }
    }

    match get_object(envelope, &format!("{}.artifacts", base)) {
        None => defects.push(Defect::missing_section(
            format!("{}.artifacts", base),
            "artifacts",
        )),
        Some(artifacts) => {
            for field in artifact_fields {
                if !crate::record::is_present(artifacts, field) {
                    defects.push(Defect::missing_field(
                        format!("{}.artifacts.{}", base, field),
                        field,
                    ));
                }
            }
        }
    }
}

/// Scalar/array/object type agreement for every field with a declared type.
pub fn data_types(envelope: &Value) -> Vec<Defect> {
    let mut defects = Vec::new();
    let mut expect = |path: &str, expected: &str| {
        expect_type(&mut defects, envelope, path, expected);
    };

    expect("schema_version", "string");

    for field in [
        "tool_name",
        "tool_version",
        "run_id",
        "target_model",
        "api_style",
        "spec_reference",
        "workspace_path",
        "run_environment",
    ] {
        expect(&format!("result_data.run_identity.{}", field), "string");
    }
    expect("result_data.run_identity.run_number", "integer");

    let api = "result_data.implementations.api";
    expect(&format!("{}.generation_metrics.llm_model", api), "string");
    expect(&format!("{}.generation_metrics.start_timestamp", api), "string");
    expect(&format!("{}.generation_metrics.end_timestamp", api), "string");
    expect(&format!("{}.generation_metrics.duration_minutes", api), "number");
    expect(
        &format!("{}.generation_metrics.clarifications_count", api),
        "integer",
    );
    expect(
        &format!("{}.generation_metrics.interventions_count", api),
        "integer",
    );
    expect(&format!("{}.generation_metrics.reruns_count", api), "integer");
    expect(&format!("{}.generation_metrics.test_runs", api), "array");
    expect(
        &format!("{}.generation_metrics.test_iterations_count", api),
        "integer",
    );

    expect(&format!("{}.acceptance.pass_count", api), "integer");
    expect(&format!("{}.acceptance.fail_count", api), "integer");
    expect(&format!("{}.acceptance.not_run_count", api), "integer");
    expect(&format!("{}.acceptance.passrate", api), "number");

    expect(
        &format!("{}.quality_metrics.determinism_compliance", api),
        "string",
    );
    expect(
        &format!("{}.quality_metrics.overreach_incidents_count", api),
        "integer",
    );
    expect(
        &format!("{}.quality_metrics.contract_completeness_passrate", api),
        "number",
    );
    expect(
        &format!("{}.quality_metrics.instructions_quality_rating", api),
        "integer",
    );
    expect(
        &format!("{}.quality_metrics.reproducibility_rating", api),
        "string",
    );

    let ui = "result_data.implementations.ui";
    expect(&format!("{}.generation_metrics.llm_model", ui), "string");
    expect(&format!("{}.generation_metrics.duration_minutes", ui), "number");
    expect(
        &format!("{}.generation_metrics.clarifications_count", ui),
        "integer",
    );
    expect(
        &format!("{}.generation_metrics.interventions_count", ui),
        "integer",
    );
    expect(&format!("{}.generation_metrics.reruns_count", ui), "integer");
    expect(
        &format!("{}.generation_metrics.backend_changes_required", ui),
        "boolean",
    );
    expect(&format!("{}.build_success", ui), "boolean");

    expect("result_data.submission.submitted_timestamp", "string");
    expect("result_data.submission.submitted_by", "string");
    expect("result_data.submission.submission_method", "string");

    defects
}

fn expect_type(defects: &mut Vec<Defect>, envelope: &Value, path: &str, expected: &str) {
    let Some(value) = get_path(envelope, path) else {
        return;
    };
    if value.is_null() {
        return;
    }
    let ok = match expected {
        "string" => value.is_string(),
        "integer" => crate::record::is_integer(value),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };
    if !ok {
        defects.push(
            Defect::new(
                DefectCategory::Type,
                path,
                format!(
                    "Type mismatch: expected {}, got {}",
                    expected,
                    type_name(value)
                ),
            )
            .with_code(codes::TYPE_MISMATCH),
        );
    }
}

/// Membership checks against the fixed value sets.
pub fn enum_values(envelope: &Value) -> Vec<Defect> {
    use serde_json::json;

    let mut defects = Vec::new();
    let mut expect = |path: &str, allowed: &[Value], field: &str| {
        expect_enum(&mut defects, envelope, path, allowed, field);
    };

    expect(
        "schema_version",
        &[json!("3.0"), json!("2.0")],
        "schema_version",
    );

    expect(
        "result_data.run_identity.target_model",
        &[json!("A"), json!("B")],
        "target_model",
    );
    expect(
        "result_data.run_identity.api_style",
        &[json!("REST"), json!("GraphQL")],
        "api_style",
    );
    expect(
        "result_data.run_identity.run_number",
        &[json!(1), json!(2)],
        "run_number",
    );

    let quality = "result_data.implementations.api.quality_metrics";
    expect(
        &format!("{}.determinism_compliance", quality),
        &[json!("Pass"), json!("Fail"), json!("Unknown")],
        "determinism_compliance",
    );
    expect(
        &format!("{}.instructions_quality_rating", quality),
        &[json!(100), json!(70), json!(40), json!(0)],
        "instructions_quality_rating",
    );
    expect(
        &format!("{}.reproducibility_rating", quality),
        &[json!("None"), json!("Minor"), json!("Major"), json!("Unknown")],
        "reproducibility_rating",
    );

    expect(
        "result_data.implementations.api.generation_metrics.llm_usage.usage_source",
        &[
            json!("tool_reported"),
            json!("operator_estimated"),
            json!("unknown"),
        ],
        "usage_source",
    );

    expect(
        "result_data.submission.submission_method",
        &[json!("automated"), json!("manual")],
        "submission_method",
    );

    expect(
        "result_data.processing.validation_status",
        &[json!("pending"), json!("valid"), json!("invalid"), json!("error")],
        "validation_status",
    );
    expect(
        "result_data.processing.storage_status",
        &[
            json!("pending"),
            json!("stored"),
            json!("failed"),
            json!("duplicate_replaced"),
        ],
        "storage_status",
    );

    defects
}

fn expect_enum(
    defects: &mut Vec<Defect>,
    envelope: &Value,
    path: &str,
    allowed: &[Value],
    field: &str,
) {
    let Some(value) = get_path(envelope, path) else {
        return;
    };
    if value.is_null() {
        return;
    }
    if !allowed.contains(value) {
        let allowed_list = allowed
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", ");
        defects.push(
            Defect::new(
                DefectCategory::Enum,
                path,
                format!(
                    "Invalid value '{}' for {}. Allowed values: {}",
                    display_value(value),
                    field,
                    allowed_list
                ),
            )
            .with_code(codes::INVALID_ENUM_VALUE),
        );
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Every field named with an absolute-time suffix (`*_timestamp`, `*_at`)
/// must match the fixed UTC profile. Recurses through nested objects and
/// arrays such as per-iteration test-run records.
pub fn formats(envelope: &Value) -> Vec<Defect> {
    let mut defects = Vec::new();
    if let Some(result_data) = get_path(envelope, "result_data") {
        walk_timestamps(result_data, "result_data", &mut defects);
    }
    defects
}

fn walk_timestamps(value: &Value, path: &str, defects: &mut Vec<Defect>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{}.{}", path, key);
                if key.ends_with("_timestamp") || key.ends_with("_at") {
                    check_timestamp(child, &child_path, key, defects);
                } else {
                    walk_timestamps(child, &child_path, defects);
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk_timestamps(item, &format!("{}[{}]", path, i), defects);
            }
        }
        _ => {}
    }
}

fn check_timestamp(value: &Value, path: &str, field: &str, defects: &mut Vec<Defect>) {
    if value.is_null() {
        return;
    }
    let Some(text) = value.as_str() else {
        defects.push(
            Defect::new(
                DefectCategory::Format,
                path,
                format!("{} must be a string in ISO-8601 format", field),
            )
            .with_code(codes::INVALID_FORMAT),
        );
        return;
    };
    if !timestamp::matches_profile(text) {
        defects.push(
            Defect::new(
                DefectCategory::Format,
                path,
                format!(
                    "Invalid timestamp format for {}: '{}'. Expected ISO-8601 UTC format: YYYY-MM-DDTHH:MM:SS.sssZ",
                    field, text
                ),
            )
            .with_code(codes::INVALID_TIMESTAMP_FORMAT),
        );
    }
}

/// Numeric bounds. Applies only to values that already carry the correct
/// numeric type; mismatches are the type pass's to report.
pub fn ranges(envelope: &Value) -> Vec<Defect> {
    let mut defects = Vec::new();
    let mut expect = |path: &str, min: Option<f64>, max: Option<f64>, field: &str| {
        expect_range(&mut defects, envelope, path, min, max, field);
    };

    let gm = "result_data.implementations.api.generation_metrics";
    expect(&format!("{}.duration_minutes", gm), Some(0.0), None, "duration_minutes");
    expect(
        &format!("{}.clarifications_count", gm),
        Some(0.0),
        None,
        "clarifications_count",
    );
    expect(
        &format!("{}.interventions_count", gm),
        Some(0.0),
        None,
        "interventions_count",
    );
    expect(&format!("{}.reruns_count", gm), Some(0.0), None, "reruns_count");
    expect(
        &format!("{}.test_iterations_count", gm),
        Some(1.0),
        None,
        "test_iterations_count",
    );

    let usage = format!("{}.llm_usage", gm);
    for field in [
        "input_tokens",
        "output_tokens",
        "total_tokens",
        "requests_count",
        "estimated_cost_usd",
    ] {
        expect(&format!("{}.{}", usage, field), Some(0.0), None, field);
    }

    let acceptance = "result_data.implementations.api.acceptance";
    expect(&format!("{}.pass_count", acceptance), Some(0.0), None, "pass_count");
    expect(&format!("{}.fail_count", acceptance), Some(0.0), None, "fail_count");
    expect(
        &format!("{}.not_run_count", acceptance),
        Some(0.0),
        None,
        "not_run_count",
    );
    expect(&format!("{}.passrate", acceptance), Some(0.0), Some(1.0), "passrate");

    let quality = "result_data.implementations.api.quality_metrics";
    expect(
        &format!("{}.overreach_incidents_count", quality),
        Some(0.0),
        None,
        "overreach_incidents_count",
    );
    expect(
        &format!("{}.contract_completeness_passrate", quality),
        Some(0.0),
        Some(1.0),
        "contract_completeness_passrate",
    );

    let scores = "result_data.implementations.api.scores";
    for field in SCORE_FIELDS {
        expect(&format!("{}.{}", scores, field), Some(0.0), Some(100.0), field);
    }
    expect(
        &format!("{}.penalty_overreach_PO", scores),
        Some(0.0),
        Some(40.0),
        "penalty_overreach_PO",
    );

    let ui = "result_data.implementations.ui.generation_metrics";
    for field in [
        "duration_minutes",
        "clarifications_count",
        "interventions_count",
        "reruns_count",
    ] {
        expect(&format!("{}.{}", ui, field), Some(0.0), None, field);
    }

    expect(
        "result_data.submission.github_issue.issue_number",
        Some(1.0),
        None,
        "issue_number",
    );
    expect(
        "result_data.storage_metadata.partition_month",
        Some(1.0),
        Some(12.0),
        "partition_month",
    );

    // Per-iteration test runs.
    if let Some(runs) = get_array(
        envelope,
        "result_data.implementations.api.generation_metrics.test_runs",
    ) {
        for (i, run) in runs.iter().enumerate() {
            let base = format!(
                "result_data.implementations.api.generation_metrics.test_runs[{}]",
                i
            );
            check_range_value(
                &mut defects,
                run.get("pass_rate"),
                &format!("{}.pass_rate", base),
                Some(0.0),
                Some(1.0),
                "pass_rate",
            );
            for field in ["total_tests", "passed", "failed"] {
                check_range_value(
                    &mut defects,
                    run.get(field),
                    &format!("{}.{}", base, field),
                    Some(0.0),
                    None,
                    field,
                );
            }
        }
    }

    defects
}

fn expect_range(
    defects: &mut Vec<Defect>,
    envelope: &Value,
    path: &str,
    min: Option<f64>,
    max: Option<f64>,
    field: &str,
) {
    check_range_value(defects, get_path(envelope, path), path, min, max, field);
}

fn check_range_value(
    defects: &mut Vec<Defect>,
    value: Option<&Value>,
    path: &str,
    min: Option<f64>,
    max: Option<f64>,
    field: &str,
) {
    let Some(value) = value else {
        return;
    };
    if !is_number(value) {
        return;
    }
    let Some(n) = value.as_f64() else {
        return;
    };
    if let Some(min) = min {
        if n < min {
            defects.push(
                Defect::new(
                    DefectCategory::Range,
                    path,
                    format!("{} value {} is below minimum {}", field, value, min),
                )
                .with_code(codes::VALUE_BELOW_MINIMUM),
            );
        }
    }
    if let Some(max) = max {
        if n > max {
            defects.push(
                Defect::new(
                    DefectCategory::Range,
                    path,
                    format!("{} value {} exceeds maximum {}", field, value, max),
                )
                .with_code(codes::VALUE_ABOVE_MAXIMUM),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_do_not_stop_other_required_checks() {
        let envelope = json!({
            "schema_version": "3.0",
            "result_data": {
                "run_identity": {"tool_name": "t"},
            }
        });
        let defects = required_fields(&envelope);
        let paths: Vec<&str> = defects.iter().map(|d| d.field_path.as_str()).collect();
        // Eight identity fields missing, plus implementations and submission.
        assert!(paths.contains(&"result_data.run_identity.run_id"));
        assert!(paths.contains(&"result_data.implementations"));
        assert!(paths.contains(&"result_data.submission"));
        assert_eq!(defects.len(), 10);
    }

    #[test]
    fn run_number_three_is_an_invalid_enum_value() {
        let envelope = json!({
            "result_data": {"run_identity": {"run_number": 3}}
        });
        let defects = enum_values(&envelope);
        let d = defects
            .iter()
            .find(|d| d.field_path == "result_data.run_identity.run_number")
            .expect("run_number defect");
        assert_eq!(d.error_code, codes::INVALID_ENUM_VALUE);
        assert!(d.message.contains("'3'"));
        assert!(d.message.contains("1, 2"));
    }

    #[test]
    fn passrate_above_one_is_flagged_above_maximum() {
        let envelope = json!({
            "result_data": {"implementations": {"api": {"acceptance": {"passrate": 1.5}}}}
        });
        let defects = ranges(&envelope);
        let d = defects
            .iter()
            .find(|d| d.field_path.ends_with("acceptance.passrate"))
            .expect("passrate defect");
        assert_eq!(d.error_code, codes::VALUE_ABOVE_MAXIMUM);
    }

    #[test]
    fn range_defers_to_type_pass_on_mistyped_values() {
        let envelope = json!({
            "result_data": {"implementations": {"api": {"acceptance": {"passrate": "1.5"}}}}
        });
        assert!(ranges(&envelope).is_empty());
        let types = data_types(&envelope);
        assert!(types
            .iter()
            .any(|d| d.field_path.ends_with("acceptance.passrate")));
    }

    #[test]
    fn format_pass_recurses_into_test_run_arrays() {
        let envelope = json!({
            "result_data": {
                "implementations": {"api": {"generation_metrics": {
                    "test_runs": [
                        {"start_timestamp": "2025-01-15T10:30:00Z"},
                        {"start_timestamp": "2025-01-15 10:30:00"}
                    ]
                }}}
            }
        });
        let defects = formats(&envelope);
        assert_eq!(defects.len(), 1);
        assert_eq!(
            defects[0].field_path,
            "result_data.implementations.api.generation_metrics.test_runs[1].start_timestamp"
        );
        assert_eq!(defects[0].error_code, codes::INVALID_TIMESTAMP_FORMAT);
    }

    #[test]
    fn non_string_timestamp_is_a_format_defect() {
        let envelope = json!({
            "result_data": {"submission": {"submitted_timestamp": 12345}}
        });
        let defects = formats(&envelope);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].error_code, codes::INVALID_FORMAT);
    }
}
