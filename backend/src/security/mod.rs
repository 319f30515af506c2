//! Input sanitization and form validation.
//!
//! Text is stripped of angle brackets, `javascript:` URLs and inline event
//! handler patterns before it is stored. The render layer relies on this and
//! does not escape again.

mod rate_limit;

pub use rate_limit::ContactLimiter;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});

static ANGLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>]").expect("angle regex"));

static JS_PROTOCOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript:").expect("protocol regex"));

static EVENT_HANDLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on\w+=").expect("event handler regex"));

/// Strip markup-significant patterns and surrounding whitespace.
pub fn sanitize_text(input: &str) -> String {
    let stripped = ANGLE_RE.replace_all(input, "");
    let stripped = JS_PROTOCOL_RE.replace_all(&stripped, "");
    let stripped = EVENT_HANDLER_RE.replace_all(&stripped, "");
    stripped.trim().to_string()
}

/// Sanitize an optional field, mapping blank input to `None`.
pub fn sanitize_optional(input: Option<&str>) -> Option<String> {
    input.map(sanitize_text).filter(|s| !s.is_empty())
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// How a field is sanitized and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
}

/// Validation rule for one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub kind: FieldKind,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FieldRule {
    pub const fn text() -> Self {
        Self {
            kind: FieldKind::Text,
            required: false,
            min_length: None,
            max_length: None,
        }
    }

    pub const fn email() -> Self {
        Self {
            kind: FieldKind::Email,
            required: false,
            min_length: None,
            max_length: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
}

/// Outcome of [`validate_form`]: sanitized values, or the first error per field.
#[derive(Debug, Default, Serialize)]
pub struct FormValidation {
    pub errors: BTreeMap<String, String>,
    pub sanitized: BTreeMap<String, String>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Sanitized value of `field`, or an empty string if it was not submitted.
    pub fn value(&self, field: &str) -> String {
        self.sanitized.get(field).cloned().unwrap_or_default()
    }
}

/// Sanitize and check each field against its rule.
///
/// Length limits count characters of the sanitized value. A later check on
/// the same field overwrites an earlier message, so the reported error is the
/// most specific one.
pub fn validate_form(fields: &[(&str, &str)], rules: &[(&str, FieldRule)]) -> FormValidation {
    let mut result = FormValidation::default();

    for (name, raw) in fields {
        let Some((_, rule)) = rules.iter().find(|(field, _)| field == name) else {
            continue;
        };

        let value = sanitize_text(raw);

        if rule.kind == FieldKind::Email && !validate_email(&value) {
            result
                .errors
                .insert(name.to_string(), "Invalid email format".to_string());
        }

        if rule.required && value.is_empty() {
            result
                .errors
                .insert(name.to_string(), "This field is required".to_string());
        }

        let len = value.chars().count();
        if let Some(min) = rule.min_length {
            if !value.is_empty() && len < min {
                result
                    .errors
                    .insert(name.to_string(), format!("Minimum length is {} characters", min));
            }
        }
        if let Some(max) = rule.max_length {
            if len > max {
                result
                    .errors
                    .insert(name.to_string(), format!("Maximum length is {} characters", max));
            }
        }

        result.sanitized.insert(name.to_string(), value);
    }

    result
}
