//! Schema validation stage.
//!
//! Five explicit passes plus the optional descriptor pass, accumulated into
//! one categorized defect list. A record is accepted iff that union is empty.

pub mod descriptor;
pub mod passes;

use crate::errors::{codes, Defect, DefectCategory};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

pub const VALIDATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Defects bucketed by category. All five buckets are always present in the
/// serialized output, empty or not.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBuckets {
    pub required_fields: Vec<Defect>,
    pub data_types: Vec<Defect>,
    pub enum_values: Vec<Defect>,
    pub formats: Vec<Defect>,
    pub ranges: Vec<Defect>,
}

impl CategoryBuckets {
    fn push(&mut self, defect: Defect) {
        match defect.category {
            DefectCategory::Required => self.required_fields.push(defect),
            DefectCategory::Type => self.data_types.push(defect),
            DefectCategory::Enum => self.enum_values.push(defect),
            DefectCategory::Format => self.formats.push(defect),
            DefectCategory::Range => self.ranges.push(defect),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<Defect>,
    pub warnings: Vec<String>,
    pub errors_by_category: CategoryBuckets,
    pub validator_version: String,
    /// The accepted record envelope; present only when `valid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_data: Option<Value>,
}

impl ValidationReport {
    fn from_defects(defects: Vec<Defect>, warnings: Vec<String>, envelope: Option<&Value>) -> Self {
        let mut buckets = CategoryBuckets::default();
        for d in &defects {
            buckets.push(d.clone());
        }
        let valid = defects.is_empty();
        Self {
            valid,
            error_count: defects.len(),
            warning_count: warnings.len(),
            errors: defects,
            warnings,
            errors_by_category: buckets,
            validator_version: VALIDATOR_VERSION.to_string(),
            validated_data: if valid { envelope.cloned() } else { None },
        }
    }
}

/// Run the five explicit passes and, when a descriptor is supplied, the
/// generic pass, deduplicated by field path + category.
pub fn validate_record(envelope: &Value, schema: Option<&Value>) -> ValidationReport {
    let mut defects = Vec::new();
    defects.extend(passes::required_fields(envelope));
    defects.extend(passes::data_types(envelope));
    defects.extend(passes::enum_values(envelope));
    defects.extend(passes::formats(envelope));
    defects.extend(passes::ranges(envelope));

    let mut warnings = Vec::new();
    if let Some(schema) = schema {
        match descriptor::descriptor_pass(envelope, schema) {
            Ok(extra) => {
                let seen: HashSet<(String, DefectCategory)> = defects
                    .iter()
                    .map(|d| (d.field_path.clone(), d.category))
                    .collect();
                for defect in extra {
                    if !seen.contains(&(defect.field_path.clone(), defect.category)) {
                        defects.push(defect);
                    }
                }
            }
            Err(warning) => warnings.push(warning),
        }
    }

    ValidationReport::from_defects(defects, warnings, Some(envelope))
}

/// Resolve the record envelope out of whatever the previous stage handed us:
/// a bare envelope, an ingest report wrapping one, or arbitrary JSON (which
/// the required pass will then fail with full diagnostics).
pub fn resolve_envelope(input: &Value) -> &Value {
    let has = |key: &str| input.get(key).is_some();
    if has("schema_version") && has("result_data") {
        return input;
    }
    if let Some(inner) = input.get("result_data") {
        if inner.is_object() {
            return inner;
        }
    }
    input
}

/// Validate a stored record file. File-level failures surface as a single
/// required-category defect, the way downstream consumers expect.
pub fn validate_file(path: &Path, schema: Option<&Value>) -> ValidationReport {
    let file_defect = |message: String, code: &str| {
        ValidationReport::from_defects(
            vec![
                Defect::new(
                    DefectCategory::Required,
                    path.display().to_string(),
                    message,
                )
                .with_code(code),
            ],
            Vec::new(),
            None,
        )
    };

    if !path.exists() {
        return file_defect(
            format!("File not found: {}", path.display()),
            codes::FILE_NOT_FOUND,
        );
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            return file_defect(
                format!("Error reading file: {}", e),
                codes::FILE_READ_ERROR,
            )
        }
    };
    let envelope: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => return file_defect(format!("Invalid JSON: {}", e), codes::INVALID_JSON),
    };

    validate_record(&envelope, schema)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidation {
    pub file: String,
    pub file_path: String,
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<Defect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub files: Vec<FileValidation>,
    pub validator_version: String,
}

/// Validate every matching file in a directory. One file's failure never
/// blocks diagnostics for the others.
pub fn validate_directory(dir: &Path, pattern: &str, schema: Option<&Value>) -> DirectoryReport {
    let failed = |error: String| DirectoryReport {
        success: false,
        error: Some(error),
        total_files: 0,
        valid_files: 0,
        invalid_files: 0,
        files: Vec::new(),
        validator_version: VALIDATOR_VERSION.to_string(),
    };

    if !dir.exists() {
        return failed(format!("Directory not found: {}", dir.display()));
    }
    if !dir.is_dir() {
        return failed(format!("Not a directory: {}", dir.display()));
    }

    let mut paths: Vec<std::path::PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| matches_pattern(n, pattern))
                        .unwrap_or(false)
            })
            .collect(),
        Err(e) => return failed(format!("Failed to read directory {}: {}", dir.display(), e)),
    };
    paths.sort();

    let mut files = Vec::new();
    let mut valid_files = 0;
    let mut invalid_files = 0;
    for path in &paths {
        let report = validate_file(path, schema);
        if report.valid {
            valid_files += 1;
        } else {
            invalid_files += 1;
        }
        files.push(FileValidation {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_path: path.display().to_string(),
            valid: report.valid,
            error_count: report.error_count,
            errors: report.errors,
        });
    }

    DirectoryReport {
        success: true,
        error: None,
        total_files: paths.len(),
        valid_files,
        invalid_files,
        files,
        validator_version: VALIDATOR_VERSION.to_string(),
    }
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_resolution_prefers_the_direct_envelope() {
        let envelope = json!({"schema_version": "3.0", "result_data": {}});
        assert_eq!(resolve_envelope(&envelope), &envelope);

        let ingest_output = json!({
            "success": true,
            "result_data": {"schema_version": "3.0", "result_data": {}}
        });
        assert_eq!(
            resolve_envelope(&ingest_output),
            &ingest_output["result_data"]
        );
    }

    #[test]
    fn descriptor_defects_dedupe_against_explicit_passes() {
        // The explicit required pass already reports schema_version; the
        // descriptor must not double it, but its extra field survives.
        let schema = json!({
            "type": "object",
            "required": ["schema_version", "extra_marker"]
        });
        let report = validate_record(&json!({"result_data": {}}), Some(&schema));
        let schema_version_defects = report
            .errors
            .iter()
            .filter(|d| d.field_path.contains("schema_version"))
            .count();
        assert_eq!(schema_version_defects, 1);
        assert!(report
            .errors
            .iter()
            .any(|d| d.message.contains("extra_marker")));
    }
}
