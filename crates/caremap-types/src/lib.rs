//! Validated text primitives shared across the caremap crates.
//!
//! Request payloads arrive as plain strings. These wrappers turn them into values that are
//! known to be well-formed, so the repositories never have to re-check a name or an email.

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The trimmed input exceeded the permitted number of characters
    #[error("Text cannot be longer than {max} characters")]
    TooLong { max: usize },
    /// The input is not a plausible email address
    #[error("Enter a valid email address")]
    InvalidEmail,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], additionally bounding the trimmed length in characters.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::TooLong`] if the trimmed text has more than `max` characters.
    pub fn bounded(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An email address that has passed a structural check.
///
/// The check is shallow: exactly one `@`, a non-empty local part, and a domain
/// containing a dot that neither starts nor ends the domain. Deliverability is not our concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Maximum length accepted for an address (RFC 5321 path limit).
    pub const MAX_LEN: usize = 254;

    /// Parses and trims an email address.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidEmail`] when the
    /// address is structurally invalid or too long.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN || trimmed.chars().any(char::is_whitespace) {
            return Err(TextError::InvalidEmail);
        }

        let (local, domain) = trimmed.split_once('@').ok_or(TextError::InvalidEmail)?;
        if local.is_empty() || domain.contains('@') {
            return Err(TextError::InvalidEmail);
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Alice  ").unwrap();
        assert_eq!(text.as_str(), "Alice");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn bounded_counts_characters_not_bytes() {
        assert!(NonEmptyText::bounded("éé", 2).is_ok());
        assert_eq!(
            NonEmptyText::bounded("abc", 2),
            Err(TextError::TooLong { max: 2 })
        );
    }

    #[test]
    fn email_accepts_ordinary_address() {
        let email = EmailAddress::parse(" dr.who@example.org ").unwrap();
        assert_eq!(email.as_str(), "dr.who@example.org");
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for bad in ["plainaddress", "@example.com", "a@b", "a@.com", "a@b.", "a b@c.com", "a@b@c.com"] {
            assert_eq!(
                EmailAddress::parse(bad),
                Err(TextError::InvalidEmail),
                "expected {bad} to be rejected"
            );
        }
    }
}
