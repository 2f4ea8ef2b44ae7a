//! Field validation shared by every entity.
//!
//! Validators push into a [`FieldErrors`] instead of returning early, so a
//! form reports all of its problems at once.

use crate::errors::FieldErrors;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Normalise a phone number to the 11-digit national form `0XXXXXXXXXX`.
///
/// Accepts any punctuation/spacing, an optional `90` country prefix and an
/// optional leading `0`. Returns `None` for anything that is not a 10-digit
/// national number after stripping. Applying it to its own output is a no-op.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        12 if digits.starts_with("90") => &digits[2..],
        11 if digits.starts_with('0') => &digits[1..],
        10 => digits.as_str(),
        _ => return None,
    };
    if national.starts_with('0') {
        return None;
    }
    Some(format!("0{national}"))
}

/// Trim and drop empty optional inputs (forms post `""` for blank fields).
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn require_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    let v = value.trim();
    if v.is_empty() {
        errors.push(field, "required");
    } else if v.chars().count() > max_len {
        errors.push(field, format!("must be at most {max_len} characters"));
    }
}

pub fn optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max_len: usize) {
    if let Some(v) = value {
        if v.chars().count() > max_len {
            errors.push(field, format!("must be at most {max_len} characters"));
        }
    }
}

pub fn validate_email(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        let valid = match v.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
            None => false,
        };
        if !valid || v.len() > 255 {
            errors.push(field, "invalid email");
        }
    }
}

pub fn validate_username(errors: &mut FieldErrors, field: &str, value: &str) {
    let v = value.trim();
    if v.len() < 3 || v.len() > 64 {
        errors.push(field, "must be 3-64 characters");
    } else if !v.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        errors.push(field, "only letters, digits, '_', '.' and '-' are allowed");
    }
}

pub fn validate_password(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.len() < MIN_PASSWORD_LEN {
        errors.push(field, format!("must be at least {MIN_PASSWORD_LEN} characters"));
    }
}

/// Validate and normalise a required phone field.
pub fn require_phone(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        errors.push(field, "required");
        return None;
    }
    let normalized = normalize_phone(value);
    if normalized.is_none() {
        errors.push(field, "invalid phone number");
    }
    normalized
}

/// Validate and normalise an optional phone field.
pub fn optional_phone(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let v = value?;
    let normalized = normalize_phone(v);
    if normalized.is_none() {
        errors.push(field, "invalid phone number");
    }
    normalized
}
