//! The submission timestamp profile: ISO-8601 UTC with a literal `Z` and an
//! optional 3-digit fraction. Both the format pass and the partition
//! derivation go through here so the two can never disagree.

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use std::sync::OnceLock;

pub const TIMESTAMP_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3})?Z$";

fn profile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).unwrap())
}

/// Strict textual check used by the format validation pass.
pub fn matches_profile(value: &str) -> bool {
    profile_re().is_match(value)
}

/// Parse an absolute instant. Accepts the profile above plus any RFC 3339
/// offset form, mirroring the store's tolerant timestamp handling.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Derive the `(year, month)` partition key for a submission timestamp.
pub fn partition_for(value: &str) -> Result<(i32, u32), chrono::ParseError> {
    let dt = parse_utc(value)?;
    Ok((dt.year(), dt.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_accepts_utc_with_and_without_millis() {
        assert!(matches_profile("2025-01-15T10:30:00.000Z"));
        assert!(matches_profile("2025-01-15T10:30:00Z"));
    }

    #[test]
    fn profile_rejects_space_separator_and_offsets() {
        assert!(!matches_profile("2025-01-15 10:30:00"));
        assert!(!matches_profile("2025-01-15T10:30:00+00:00"));
        assert!(!matches_profile("2025-01-15T10:30:00.0Z"));
    }

    #[test]
    fn partition_is_year_and_month() {
        assert_eq!(partition_for("2025-03-02T00:00:00Z").unwrap(), (2025, 3));
        assert!(partition_for("not-a-timestamp").is_err());
    }
}
