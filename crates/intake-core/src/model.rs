use serde::{Deserialize, Serialize};

/// Which technique located the payload inside the free-form body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// A fenced code block tagged as JSON.
    CodeBlock,
    /// Longest balanced-brace substring that parses.
    BalancedBraces,
    /// Line-buffered accumulation fallback.
    LineBuffered,
    /// No candidate payload was found.
    None,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::CodeBlock => "code_block",
            ExtractionMethod::BalancedBraces => "balanced_braces",
            ExtractionMethod::LineBuffered => "line_buffered",
            ExtractionMethod::None => "none",
        }
    }
}

/// Metadata lifted from the surrounding issue event, carried through the
/// pipeline for provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Parse failure location reported by the syntax validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The parser message already carries its own location detail.
        write!(f, "Invalid JSON syntax: {}", self.message)
    }
}
