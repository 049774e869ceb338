//! Input validation utilities.
//!
//! Every function here turns a raw request value into a validated one or a
//! [`CareError::Validation`] naming the offending field.

use crate::constants::{
    AGE_MAX, CONTACT_NUMBER_MAX_LEN, PASSWORD_MIN_LEN, USERNAME_MAX_LEN,
};
use crate::{CareError, CareResult};
use caremap_types::{EmailAddress, NonEmptyText, TextError};

/// Required, trimmed text of at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> CareResult<NonEmptyText> {
    NonEmptyText::bounded(value, max).map_err(|e| text_error(field, e))
}

/// Optional free text (may be blank) of at most `max` characters, trimmed.
pub fn optional_text(field: &str, value: &str, max: usize) -> CareResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        return Err(text_error(field, TextError::TooLong { max }));
    }
    Ok(trimmed.to_owned())
}

pub fn email(field: &str, value: &str) -> CareResult<EmailAddress> {
    EmailAddress::parse(value).map_err(|e| text_error(field, e))
}

/// Patient age: a whole number of years between 0 and [`AGE_MAX`].
pub fn age(value: i64) -> CareResult<u32> {
    if value < 0 {
        return Err(CareError::field("age", "must not be negative"));
    }
    match u32::try_from(value) {
        Ok(age) if age <= AGE_MAX => Ok(age),
        _ => Err(CareError::field(
            "age",
            format!("must be at most {AGE_MAX}"),
        )),
    }
}

/// Contact number: digits plus `+`, `-`, `(`, `)` and spaces, with at least one digit.
pub fn contact_number(value: &str) -> CareResult<NonEmptyText> {
    let text = required_text("contact_number", value, CONTACT_NUMBER_MAX_LEN)?;
    let allowed = text
        .as_str()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    if !allowed || !text.as_str().chars().any(|c| c.is_ascii_digit()) {
        return Err(CareError::field(
            "contact_number",
            "may only contain digits, spaces and + - ( )",
        ));
    }
    Ok(text)
}

/// Username: 1–150 characters of letters, digits and `@ . + - _`.
pub fn username(value: &str) -> CareResult<NonEmptyText> {
    let text = required_text("username", value, USERNAME_MAX_LEN)?;
    let ok = text
        .as_str()
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !ok {
        return Err(CareError::field(
            "username",
            "may only contain letters, digits and @ . + - _",
        ));
    }
    Ok(text)
}

/// Password strength check. Only length is enforced.
pub fn password(value: &str) -> CareResult<()> {
    if value.chars().count() < PASSWORD_MIN_LEN {
        return Err(CareError::field(
            "password",
            format!("must contain at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    Ok(())
}

fn text_error(field: &str, err: TextError) -> CareError {
    match err {
        TextError::Empty => CareError::field(field, "this field may not be blank"),
        other => CareError::field(field, other),
    }
}
