use serde::{Deserialize, Serialize};

/// The five validation dimensions. Every defect belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefectCategory {
    #[serde(rename = "required_fields")]
    Required,
    #[serde(rename = "data_types")]
    Type,
    #[serde(rename = "enum_values")]
    Enum,
    #[serde(rename = "formats")]
    Format,
    #[serde(rename = "ranges")]
    Range,
}

impl DefectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectCategory::Required => "required_fields",
            DefectCategory::Type => "data_types",
            DefectCategory::Enum => "enum_values",
            DefectCategory::Format => "formats",
            DefectCategory::Range => "ranges",
        }
    }

    pub fn default_code(&self) -> &'static str {
        match self {
            DefectCategory::Required => codes::REQUIRED_FIELD_MISSING,
            DefectCategory::Type => codes::TYPE_MISMATCH,
            DefectCategory::Enum => codes::INVALID_ENUM_VALUE,
            DefectCategory::Format => codes::INVALID_FORMAT,
            DefectCategory::Range => codes::VALUE_OUT_OF_RANGE,
        }
    }
}

impl std::fmt::Display for DefectCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation failure: where it is, what is wrong, and a stable code
/// machine consumers can key on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    pub category: DefectCategory,
    pub field_path: String,
    pub message: String,
    pub error_code: String,
}

impl Defect {
    pub fn new(
        category: DefectCategory,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            field_path: field_path.into(),
            message: message.into(),
            error_code: category.default_code().to_string(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = code.into();
        self
    }

    pub fn missing_field(field_path: impl Into<String>, field: &str) -> Self {
        Self::new(
            DefectCategory::Required,
            field_path,
            format!("Missing required field '{}'", field),
        )
    }

    pub fn missing_section(field_path: impl Into<String>, section: &str) -> Self {
        Self::new(
            DefectCategory::Required,
            field_path,
            format!("Missing required section '{}'", section),
        )
        .with_code(codes::REQUIRED_SECTION_MISSING)
    }
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.error_code, self.field_path, self.message)
    }
}

/// Stable machine-readable codes carried on defects.
pub mod codes {
    pub const REQUIRED_FIELD_MISSING: &str = "REQUIRED_FIELD_MISSING";
    pub const REQUIRED_SECTION_MISSING: &str = "REQUIRED_SECTION_MISSING";
    pub const REQUIRED_IMPLEMENTATION_MISSING: &str = "REQUIRED_IMPLEMENTATION_MISSING";
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const INVALID_ENUM_VALUE: &str = "INVALID_ENUM_VALUE";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const INVALID_TIMESTAMP_FORMAT: &str = "INVALID_TIMESTAMP_FORMAT";
    pub const VALUE_BELOW_MINIMUM: &str = "VALUE_BELOW_MINIMUM";
    pub const VALUE_ABOVE_MAXIMUM: &str = "VALUE_ABOVE_MAXIMUM";
    pub const VALUE_OUT_OF_RANGE: &str = "VALUE_OUT_OF_RANGE";

    // File-level failures surfaced during batch validation.
    pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
    pub const INVALID_JSON: &str = "INVALID_JSON";
    pub const FILE_READ_ERROR: &str = "FILE_READ_ERROR";
}

#[cfg(test)]
mod tests {
    use super::{codes, Defect, DefectCategory};

    #[test]
    fn defect_carries_default_code_for_category() {
        let d = Defect::new(DefectCategory::Enum, "a.b", "bad value");
        assert_eq!(d.error_code, codes::INVALID_ENUM_VALUE);

        let d = Defect::missing_section("result_data.submission", "submission");
        assert_eq!(d.error_code, codes::REQUIRED_SECTION_MISSING);
        assert_eq!(d.category, DefectCategory::Required);
    }

    #[test]
    fn category_serializes_with_original_names() {
        let s = serde_json::to_string(&DefectCategory::Type).unwrap();
        assert_eq!(s, "\"data_types\"");
    }
}
