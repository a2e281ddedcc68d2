// src/models/identity.rs

use std::fmt;

use serde::Serialize;
use validator::ValidateEmail;

use crate::exam::error::ExamError;

/// The validated, email-shaped string identifying a test taker.
///
/// Always stored lower-cased so registry lookups and history rows
/// agree on a single spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Validates and normalizes a raw identity string.
    ///
    /// Surrounding whitespace is ignored. Anything that is not syntactically
    /// an email address is rejected before any lookup can happen.
    pub fn parse(raw: &str) -> Result<Self, ExamError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ExamError::Validation("identity is required".to_string()));
        }

        if !normalized.validate_email() {
            return Err(ExamError::Validation(format!(
                "'{}' is not a valid email address",
                raw.trim()
            )));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
