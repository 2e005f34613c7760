//! Payload extraction from free-form submission bodies.
//!
//! Three techniques, tried in order: a JSON-tagged fenced block, the longest
//! balanced-brace substring that parses, and a line-buffered fallback. The
//! balanced scan is deliberately exhaustive (every opening brace, every
//! balancing close) so decorative or nested braces ahead of the real payload
//! never win over it.

use crate::model::ExtractionMethod;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Extraction {
    pub payload: Option<String>,
    pub method: ExtractionMethod,
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)\s*\n(.*?)```").unwrap())
}

/// Locate the best candidate payload in `body`. Pure function of the input.
pub fn extract_payload(body: &str) -> Extraction {
    if body.trim().is_empty() {
        return Extraction {
            payload: None,
            method: ExtractionMethod::None,
        };
    }

    if let Some(block) = first_fenced_block(body) {
        return Extraction {
            payload: Some(block),
            method: ExtractionMethod::CodeBlock,
        };
    }

    if let Some(candidate) = longest_balanced_candidate(body) {
        return Extraction {
            payload: Some(candidate),
            method: ExtractionMethod::BalancedBraces,
        };
    }

    if let Some(candidate) = line_buffered_candidate(body) {
        return Extraction {
            payload: Some(candidate),
            method: ExtractionMethod::LineBuffered,
        };
    }

    Extraction {
        payload: None,
        method: ExtractionMethod::None,
    }
}

fn first_fenced_block(body: &str) -> Option<String> {
    for caps in fence_re().captures_iter(body) {
        let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if !candidate.is_empty() {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Scan every opening-brace position and every subsequent balancing close,
/// keeping the longest substring that parses as JSON. Brace depth is tracked
/// string-aware so braces inside JSON string literals do not end a candidate.
fn longest_balanced_candidate(body: &str) -> Option<String> {
    let bytes = body.as_bytes();
    let mut candidates: Vec<(usize, usize)> = Vec::new();

    for start in 0..bytes.len() {
        if bytes[start] != b'{' {
            continue;
        }
        let mut depth = 0i64;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, b) in bytes[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if *b == b'\\' {
                    escaped = true;
                } else if *b == b'"' {
                    in_string = false;
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        candidates.push((start, start + offset + 1));
                    }
                }
                _ => {}
            }
        }
    }

    // Longest first: the maximal unambiguous extraction wins.
    candidates.sort_by_key(|(s, e)| std::cmp::Reverse(e - s));
    for (s, e) in candidates {
        if !body.is_char_boundary(s) || !body.is_char_boundary(e) {
            continue;
        }
        let slice = &body[s..e];
        if serde_json::from_str::<Value>(slice).is_ok() {
            return Some(slice.to_string());
        }
    }
    None
}

/// Accumulate lines from the first one starting with `{` until brace counts
/// balance, retrying the parse on each balanced candidate.
fn line_buffered_candidate(body: &str) -> Option<String> {
    let mut buffer: Vec<&str> = Vec::new();
    let mut depth = 0i64;
    let mut collecting = false;

    for line in body.lines() {
        let stripped = line.trim();
        if !collecting {
            if stripped.starts_with('{') {
                collecting = true;
                buffer.clear();
                buffer.push(stripped);
                depth = brace_delta(stripped);
            }
            continue;
        }

        buffer.push(line);
        depth += brace_delta(line);

        if depth <= 0 && stripped.ends_with('}') {
            let candidate = buffer.join("\n");
            let candidate = candidate.trim();
            if serde_json::from_str::<Value>(candidate).is_ok() {
                return Some(candidate.to_string());
            }
            buffer.clear();
            collecting = false;
            depth = 0;
        }
    }
    None
}

fn brace_delta(line: &str) -> i64 {
    let opens = line.matches('{').count() as i64;
    let closes = line.matches('}').count() as i64;
    opens - closes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_wins_over_decorative_braces() {
        let body = "intro {} noise\n```json\n{\"a\": 1}\n```\ntrailer";
        let ex = extract_payload(body);
        assert_eq!(ex.method, ExtractionMethod::CodeBlock);
        assert_eq!(ex.payload.as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn balanced_scan_returns_the_well_formed_substring() {
        let body = "Here are my results: {\"score\": 10} thanks!";
        let ex = extract_payload(body);
        assert_eq!(ex.method, ExtractionMethod::BalancedBraces);
        assert_eq!(ex.payload.as_deref(), Some("{\"score\": 10}"));
    }

    #[test]
    fn balanced_scan_prefers_the_longer_outer_candidate() {
        // The inner object also balances; only the outer one may win.
        let body = "x {\"outer\": {\"inner\": 1}} y";
        let ex = extract_payload(body);
        assert_eq!(ex.method, ExtractionMethod::BalancedBraces);
        assert_eq!(ex.payload.as_deref(), Some("{\"outer\": {\"inner\": 1}}"));
    }

    #[test]
    fn braces_inside_string_literals_do_not_end_a_candidate() {
        let body = "see {\"note\": \"uses } inside\"} end";
        let ex = extract_payload(body);
        assert_eq!(ex.method, ExtractionMethod::BalancedBraces);
        assert_eq!(ex.payload.as_deref(), Some("{\"note\": \"uses } inside\"}"));
    }

    #[test]
    fn no_payload_reports_none() {
        let ex = extract_payload("just words, no data here");
        assert_eq!(ex.method, ExtractionMethod::None);
        assert!(ex.payload.is_none());
    }

    #[test]
    fn empty_fenced_block_falls_through_to_scan() {
        let body = "```json\n\n```\n{\"k\": true}";
        let ex = extract_payload(body);
        assert_eq!(ex.method, ExtractionMethod::BalancedBraces);
        assert_eq!(ex.payload.as_deref(), Some("{\"k\": true}"));
    }
}
