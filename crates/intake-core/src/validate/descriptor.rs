//! Optional generic pass against an external JSON Schema descriptor.
//!
//! Best-effort by contract: a missing or uncompilable descriptor degrades to
//! explicit-checks-only and must never block the five explicit passes.

use crate::errors::{Defect, DefectCategory};
use anyhow::Context;
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::path::Path;

/// Load a schema descriptor from disk.
pub fn load_descriptor(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema descriptor: {}", path.display()))?;
    let schema: Value = serde_json::from_str(&raw)
        .with_context(|| format!("schema descriptor is not valid JSON: {}", path.display()))?;
    Ok(schema)
}

/// Diff the record against the descriptor, mapping every violation onto one
/// of the five defect categories. Returns an error string (for the warning
/// list) when the descriptor itself does not compile.
pub fn descriptor_pass(envelope: &Value, schema: &Value) -> Result<Vec<Defect>, String> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| format!("schema descriptor failed to compile: {}", e))?;

    let mut defects = Vec::new();
    if let Err(errors) = compiled.validate(envelope) {
        for error in errors {
            let mut field_path = dotted_path(&error.instance_path.to_string());
            // Required violations point at the parent object; extend the path
            // with the missing property so it lines up with the explicit
            // passes and dedupes against them.
            if let ValidationErrorKind::Required { property } = &error.kind {
                let prop = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                field_path = if field_path == "root" {
                    prop
                } else {
                    format!("{}.{}", field_path, prop)
                };
            }
            let (category, code) = classify(&error.kind);
            defects.push(
                Defect::new(category, field_path, error.to_string()).with_code(code),
            );
        }
    }
    Ok(defects)
}

fn dotted_path(pointer: &str) -> String {
    let dotted = pointer.trim_start_matches('/').replace('/', ".");
    if dotted.is_empty() {
        "root".to_string()
    } else {
        dotted
    }
}

fn classify(kind: &ValidationErrorKind) -> (DefectCategory, &'static str) {
    match kind {
        ValidationErrorKind::Required { .. } => (DefectCategory::Required, "REQUIRED"),
        ValidationErrorKind::Type { .. } => (DefectCategory::Type, "TYPE"),
        ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => {
            (DefectCategory::Enum, "ENUM")
        }
        ValidationErrorKind::Pattern { .. } => (DefectCategory::Format, "PATTERN"),
        ValidationErrorKind::Format { .. } => (DefectCategory::Format, "FORMAT"),
        ValidationErrorKind::Minimum { .. } | ValidationErrorKind::ExclusiveMinimum { .. } => {
            (DefectCategory::Range, "MINIMUM")
        }
        ValidationErrorKind::Maximum { .. } | ValidationErrorKind::ExclusiveMaximum { .. } => {
            (DefectCategory::Range, "MAXIMUM")
        }
        _ => (DefectCategory::Required, "SCHEMA"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_violations_map_onto_categories() {
        let schema = json!({
            "type": "object",
            "required": ["schema_version"],
            "properties": {
                "schema_version": {"type": "string", "enum": ["3.0", "2.0"]}
            }
        });

        let missing = json!({});
        let defects = descriptor_pass(&missing, &schema).unwrap();
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].category, DefectCategory::Required);
        assert_eq!(defects[0].field_path, "schema_version");

        let wrong = json!({"schema_version": "9.9"});
        let defects = descriptor_pass(&wrong, &schema).unwrap();
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].category, DefectCategory::Enum);
        assert_eq!(defects[0].field_path, "schema_version");
    }

    #[test]
    fn uncompilable_descriptor_degrades_to_a_warning() {
        let schema = json!({"type": "not-a-real-type"});
        let err = descriptor_pass(&json!({}), &schema).unwrap_err();
        assert!(err.contains("compile"));
    }
}
