// src/models/test_reference.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::exam::error::ExamError;

/// `{label}-{typeId}` where the label is everything before the last hyphen
/// (normally `name-team`) and the type id is the trailing numeric token.
static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<label>.+)-(?<type_id>[0-9]+)$").expect("slug pattern is a valid regex")
});

/// A parsed shareable test link slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestReference {
    pub slug: String,
    /// `name-team` part of the slug, kept verbatim.
    pub label: String,
    pub type_id: i64,
}

impl TestReference {
    /// Parses a slug of the form `name-team-typeId`.
    ///
    /// Only the last hyphen-delimited token is interpreted. Slugs whose
    /// name or team segment is itself numeric still resolve to the last token.
    pub fn parse(slug: &str) -> Result<Self, ExamError> {
        let slug = slug.trim();
        let caps = SLUG_PATTERN
            .captures(slug)
            .ok_or_else(|| ExamError::InvalidTestReference(slug.to_string()))?;

        let type_id = caps["type_id"]
            .parse::<i64>()
            .map_err(|_| ExamError::InvalidTestReference(slug.to_string()))?;

        Ok(Self {
            slug: slug.to_string(),
            label: caps["label"].to_string(),
            type_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trailing_type_id() {
        let reference = TestReference::parse("alice-engineering-42").unwrap();
        assert_eq!(reference.type_id, 42);
        assert_eq!(reference.label, "alice-engineering");
    }

    #[test]
    fn test_parse_numeric_segments_use_last_token() {
        let reference = TestReference::parse("7-2024-3").unwrap();
        assert_eq!(reference.type_id, 3);
        assert_eq!(reference.label, "7-2024");
    }

    #[test]
    fn test_parse_rejects_missing_type_id() {
        for slug in ["", "42", "alice-engineering", "alice-engineering-", "alice-eng-4x", "-42"] {
            assert!(
                matches!(TestReference::parse(slug), Err(ExamError::InvalidTestReference(_))),
                "{slug:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflowing_type_id() {
        let err = TestReference::parse("a-b-99999999999999999999").unwrap_err();
        assert!(matches!(err, ExamError::InvalidTestReference(_)));
    }
}
