//! Field-level request validation.
//!
//! Each field is checked against an ordered list of rules and only the first failure is reported,
//! so [`FieldErrors::add`] ignores later messages for a field that already failed. Rules that need
//! the database (duplicate names, existence of referenced rows) run in the handlers after the
//! static rules, and only for fields that are still clean.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::errors::Error;

pub const PASSWORD_NULL: &str = "Password cannot be null";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const PASSWORD_TOO_WEAK: &str = "Password must have at least 1 uppercase, 1 lowercase letter and 1 number";
pub const EMAIL_NULL: &str = "E-mail cannot be null";
pub const EMAIL_INVALID: &str = "E-mail is not valid";
pub const EMAIL_IN_USE: &str = "E-mail in use";
pub const USERNAME_NULL: &str = "Username cannot be null";
pub const USERNAME_LENGTH: &str = "Must have min 4 and max 32 characters";
pub const USERNAME_IN_USE: &str = "Username in use";
pub const FULL_NAME_LENGTH: &str = "Must have max 70 characters";
pub const NAME_LENGTH_32: &str = "Must have min 1 and max 32 characters";
pub const NOT_A_NUMBER: &str = "Must be a number";
pub const DATE_INVALID: &str = "Date is not valid";

const PASSWORD_MIN_CHARS: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .expect("email pattern is valid")
});

/// Validation failures keyed by request field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field` unless an earlier rule already failed for it.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Turn the collected failures into a `400` if there are any.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() { Ok(()) } else { Err(Error::Validation { errors: self }) }
    }
}

impl From<(&'static str, &str)> for FieldErrors {
    fn from((field, message): (&'static str, &str)) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

/// Trimmed value, or `None` when the field is missing or blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Length in characters, not bytes.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn within(value: &str, min: usize, max: usize) -> bool {
    let len = char_len(value);
    len >= min && len <= max
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Required, non-blank text with a length range. Returns the trimmed value when it passed.
pub fn required_text<'a>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&'a str>,
    null_message: &str,
    (min, max): (usize, usize),
    length_message: &str,
) -> Option<&'a str> {
    match present(value) {
        None => {
            errors.add(field, null_message);
            None
        }
        Some(v) if !within(v, min, max) => {
            errors.add(field, length_message);
            None
        }
        Some(v) => Some(v),
    }
}

/// Optional text with an upper bound. Blank counts as absent.
pub fn optional_text<'a>(errors: &mut FieldErrors, field: &'static str, value: Option<&'a str>, max: usize, message: &str) -> Option<&'a str> {
    let value = present(value)?;
    if char_len(value) > max {
        errors.add(field, message);
        None
    } else {
        Some(value)
    }
}

/// Required e-mail: presence then syntax.
pub fn required_email<'a>(errors: &mut FieldErrors, field: &'static str, value: Option<&'a str>) -> Option<&'a str> {
    match present(value) {
        None => {
            errors.add(field, EMAIL_NULL);
            None
        }
        Some(v) if !is_email(v) => {
            errors.add(field, EMAIL_INVALID);
            None
        }
        Some(v) => Some(v),
    }
}

/// Password strength: presence, minimum length, then one digit, one lowercase and one uppercase.
pub fn password_failure(value: Option<&str>) -> Option<&'static str> {
    let Some(value) = present(value) else {
        return Some(PASSWORD_NULL);
    };
    if char_len(value) < PASSWORD_MIN_CHARS {
        return Some(PASSWORD_TOO_SHORT);
    }
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    if !(has_digit && has_lower && has_upper) {
        return Some(PASSWORD_TOO_WEAK);
    }
    None
}

/// Password that passed [`password_failure`], trimmed the way it is stored.
pub fn required_password<'a>(errors: &mut FieldErrors, field: &'static str, value: Option<&'a str>) -> Option<&'a str> {
    match password_failure(value) {
        Some(message) => {
            errors.add(field, message);
            None
        }
        None => present(value),
    }
}

/// Null, or a string that is empty after trimming. Loosely typed body fields treat both as absent.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// An id given either as a JSON integer or as a numeric string.
pub fn as_id(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => crate::types::parse_id(s),
        _ => None,
    }
}

/// A finite number given either as a JSON number or as a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// A calendar date as `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Optional number field. Blank reads as absent; anything else must parse.
pub fn optional_number(errors: &mut FieldErrors, field: &'static str, value: Option<&Value>) -> Option<f64> {
    let value = value.filter(|v| !is_blank(v))?;
    let number = as_number(value);
    if number.is_none() {
        errors.add(field, NOT_A_NUMBER);
    }
    number
}

/// Optional date field. Blank reads as absent; anything else must parse.
pub fn optional_date(errors: &mut FieldErrors, field: &'static str, value: Option<&str>) -> Option<NaiveDate> {
    let value = present(value)?;
    let date = parse_date(value);
    if date.is_none() {
        errors.add(field, DATE_INVALID);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_wins() {
        let mut errors = FieldErrors::new();
        errors.add("username", USERNAME_NULL);
        errors.add("username", USERNAME_LENGTH);
        assert_eq!(errors.get("username"), Some(USERNAME_NULL));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let err = FieldErrors::from(("email", EMAIL_IN_USE)).into_result().unwrap_err();
        match err {
            Error::Validation { errors } => assert_eq!(errors.get("email"), Some(EMAIL_IN_USE)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(password_failure(None), Some(PASSWORD_NULL));
        assert_eq!(password_failure(Some("   ")), Some(PASSWORD_NULL));
        assert_eq!(password_failure(Some("Ab1")), Some(PASSWORD_TOO_SHORT));
        assert_eq!(password_failure(Some("alllowercase1")), Some(PASSWORD_TOO_WEAK));
        assert_eq!(password_failure(Some("ALLUPPER1")), Some(PASSWORD_TOO_WEAK));
        assert_eq!(password_failure(Some("NoDigitsHere")), Some(PASSWORD_TOO_WEAK));
        assert_eq!(password_failure(Some("P4ssword")), None);
    }

    #[test]
    fn test_required_password_is_trimmed() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_password(&mut errors, "password", Some("  P4ssword ")), Some("P4ssword"));
        assert_eq!(required_password(&mut errors, "password", Some("weak")), None);
        assert_eq!(errors.get("password"), Some(PASSWORD_TOO_SHORT));
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_email("user1@mail.com"));
        assert!(is_email("first.last+tag@sub.example.co"));
        assert!(!is_email("mail.com"));
        assert!(!is_email("user@mail"));
        assert!(!is_email("user@@mail.com"));
        assert!(!is_email("us er@mail.com"));
    }

    #[test]
    fn test_required_text_trims_and_bounds() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required_text(&mut errors, "username", Some("  user1  "), USERNAME_NULL, (4, 32), USERNAME_LENGTH),
            Some("user1")
        );
        assert!(required_text(&mut errors, "username", Some("usr"), USERNAME_NULL, (4, 32), USERNAME_LENGTH).is_none());
        assert_eq!(errors.get("username"), Some(USERNAME_LENGTH));

        let mut errors = FieldErrors::new();
        assert!(required_text(&mut errors, "username", Some(""), USERNAME_NULL, (4, 32), USERNAME_LENGTH).is_none());
        assert_eq!(errors.get("username"), Some(USERNAME_NULL));
    }

    #[test]
    fn test_length_counts_characters() {
        let name = "ü".repeat(32);
        assert!(within(&name, 1, 32));
        assert!(!within(&format!("{name}x"), 1, 32));
    }

    #[test]
    fn test_optional_text() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_text(&mut errors, "fullName", None, 70, FULL_NAME_LENGTH), None);
        assert_eq!(optional_text(&mut errors, "fullName", Some(""), 70, FULL_NAME_LENGTH), None);
        assert!(errors.is_empty());
        let long = "a".repeat(71);
        assert_eq!(optional_text(&mut errors, "fullName", Some(&long), 70, FULL_NAME_LENGTH), None);
        assert_eq!(errors.get("fullName"), Some(FULL_NAME_LENGTH));
    }

    #[test]
    fn test_loose_values() {
        use serde_json::json;

        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(!is_blank(&json!(0)));

        assert_eq!(as_id(&json!(5)), Some(5));
        assert_eq!(as_id(&json!("5")), Some(5));
        assert_eq!(as_id(&json!("five")), None);
        assert_eq!(as_id(&json!(1.5)), None);

        assert_eq!(as_number(&json!(12.5)), Some(12.5));
        assert_eq!(as_number(&json!("12.5")), Some(12.5));
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(true)), None);
    }

    #[test]
    fn test_dates() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("2024-03-01T10:00:00Z"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("yesterday"), None);

        let mut errors = FieldErrors::new();
        assert_eq!(optional_date(&mut errors, "saleDate", Some("")), None);
        assert!(errors.is_empty());
        assert_eq!(optional_date(&mut errors, "saleDate", Some("31/12/2024")), None);
        assert_eq!(errors.get("saleDate"), Some(DATE_INVALID));
    }
}
