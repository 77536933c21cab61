//! Field-level validation helpers.
//!
//! Request structs derive [`validator::Validate`]; this module flattens the
//! resulting [`ValidationErrors`] into the envelope's `errors` map and hosts
//! the custom rules that the derive attributes reference.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

use crate::constants::MAX_TAGS_PER_POST;
use crate::error::FieldErrors;

/// Flatten validator output into `field -> [messages]`.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs.iter().map(describe).collect();
        out.insert(field.to_string(), messages);
    }
    out
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    let param = |name: &str| err.params.get(name).map(|v| v.to_string());
    match err.code.as_ref() {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => {
                format!("Ensure this field has between {min} and {max} characters.")
            }
            (Some(min), None) => format!("Ensure this field has at least {min} characters."),
            (None, Some(max)) => format!("Ensure this field has no more than {max} characters."),
            (None, None) => "Invalid length.".to_string(),
        },
        "email" => "Enter a valid email address.".to_string(),
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("Ensure this value is between {min} and {max}."),
            _ => "Value out of range.".to_string(),
        },
        other => other.to_string(),
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS_PER_POST {
        return Err(rule("tags", "Ensure this field has no more than 10 tags."));
    }
    for tag in tags {
        let len = tag.trim().chars().count();
        if len == 0 || len > 50 {
            return Err(rule("tags", "Each tag must be between 1 and 50 characters."));
        }
    }
    Ok(())
}

/// E.164-ish: optional leading `+`, then 7 to 15 digits, spaces and dashes
/// ignored.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let digits: String = digits.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(rule("phone_number", "Enter a valid phone number."))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(rule("blank", "This field may not be blank."))
    } else {
        Ok(())
    }
}

/// Lower-case, trim and de-duplicate tags, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_limit_and_length() {
        assert!(validate_tags(&["rust".into(), "web".into()]).is_ok());
        assert!(validate_tags(&vec!["t".to_string(); 11]).is_err());
        assert!(validate_tags(&["  ".into()]).is_err());
        assert!(validate_tags(&["x".repeat(51)]).is_err());
    }

    #[test]
    fn phone_numbers() {
        assert!(validate_phone_number("+254 712-345-678").is_ok());
        assert!(validate_phone_number("0712345678").is_ok());
        assert!(validate_phone_number("12ab").is_err());
        assert!(validate_phone_number("+1").is_err());
    }

    #[test]
    fn normalize_dedups_case_insensitively() {
        let tags = normalize_tags(&["Rust".into(), " rust ".into(), "Axum".into(), "".into()]);
        assert_eq!(tags, vec!["rust".to_string(), "axum".to_string()]);
    }
}
