// Common validation types, traits and the field rule interpreter

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }

    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

/// A single constraint on a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be present and non-blank.
    Required,
    /// Absent or empty values skip every remaining rule for the field.
    OmitEmpty,
    Email,
    /// Minimum length in characters.
    MinLen(usize),
    /// Maximum length in characters.
    MaxLen(usize),
    /// Maximum length in UTF-8 bytes.
    MaxBytes(usize),
}

/// One row of a request's rule table: the field name as it appears in JSON,
/// the value pulled out of the request, and the rules applied in order.
pub struct FieldRules<'a> {
    pub field: &'static str,
    pub value: Option<&'a str>,
    pub rules: &'static [Rule],
}

impl<'a> FieldRules<'a> {
    pub fn new(field: &'static str, value: Option<&'a str>, rules: &'static [Rule]) -> Self {
        Self {
            field,
            value,
            rules,
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile")
    })
}

/// Evaluates a rule table, reporting at most one violation per field.
pub fn evaluate(table: &[FieldRules<'_>]) -> ValidationResult {
    let mut result = ValidationResult::new();

    for row in table {
        let value = row.value.unwrap_or("");
        let length = value.chars().count();

        for rule in row.rules {
            let violation = match *rule {
                Rule::Required if value.trim().is_empty() => Some("is required".to_string()),
                Rule::Required => None,
                Rule::OmitEmpty if value.is_empty() => break,
                Rule::OmitEmpty => None,
                Rule::Email if !email_regex().is_match(value) => {
                    Some("must be a valid email address".to_string())
                }
                Rule::Email => None,
                Rule::MinLen(min) if length < min => {
                    Some(format!("must be at least {} characters", min))
                }
                Rule::MinLen(_) => None,
                Rule::MaxLen(max) if length > max => {
                    Some(format!("must be at most {} characters", max))
                }
                Rule::MaxLen(_) => None,
                Rule::MaxBytes(max) if value.len() > max => {
                    Some(format!("must be at most {} bytes", max))
                }
                Rule::MaxBytes(_) => None,
            };

            if let Some(message) = violation {
                result.add_error(row.field, &message);
                break;
            }
        }
    }

    result
}
