//! Internal implementation of [`RecordId`].

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

use uuid::Uuid;

/// Canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed the contained UUID is guaranteed to render in canonical form, which is the
/// form used both as the SQL primary key and in REST paths.
///
/// # Construction
/// - [`RecordId::new`] generates a fresh identifier for a new record.
/// - [`RecordId::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Generates a new random (version 4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or
    /// uppercase).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, each one of `0-9` or `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = RecordId::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(RecordId::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_uuid() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id = RecordId::parse(canonical).expect("canonical id should parse");
        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_uuid() {
        let result = RecordId::parse("550e8400-e29b-41d4-a716-446655440000");
        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            Ok(_) => panic!("hyphenated form should be rejected"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_and_wrong_length() {
        assert!(RecordId::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(RecordId::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(RecordId::parse("550e8400e29b41d4a7164466554400000").is_err());
        assert!(RecordId::parse("550e8400e29b41d4a71644665544000g").is_err());
    }

    #[test]
    fn test_from_str_round_trips_display() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
