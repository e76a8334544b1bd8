//! Declarative field validation.
//!
//! # Responsibilities
//! - Define the rule vocabulary (required, length range, pattern, set membership)
//! - Execute an ordered rule table against a raw field map
//! - Report every violated rule, not just the first
//!
//! # Design Decisions
//! - Validation is a pure function: field map in, violation list out
//! - Violations surface in rule-declaration order so responses are stable
//! - A failed `Required` suppresses the remaining rules for that field;
//!   length or pattern complaints about an empty string add noise, not signal
//! - Optional fields (no `Required` rule) skip their other rules when absent

pub mod patterns;

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Raw field-value mapping as received from a form post.
pub type FieldMap = HashMap<String, String>;

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (`fullName`, `email`, ...).
    pub field: String,
    /// Human-readable description that reads after the field name.
    pub message: String,
    /// The rejected input, absent for missing-field violations.
    #[serde(rename = "offendingValue", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            value: value.map(str::to_string),
        }
    }
}

/// One validation rule applied to a named field.
pub enum Rule {
    /// Field must be present and non-empty after trimming.
    Required,
    /// Character count (not bytes) must fall within `min..=max`.
    Length { min: usize, max: usize },
    /// Value must match the pattern; `hint` becomes the violation message.
    Pattern {
        re: &'static LazyLock<Regex>,
        hint: &'static str,
    },
    /// Value must be a member of the fixed set; `hint` becomes the message.
    OneOf {
        allowed: &'static [&'static str],
        hint: &'static str,
    },
}

/// An ordered table of `(field, rules)` declarations.
pub struct RuleSet {
    fields: Vec<(&'static str, Vec<Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare the rules for one field. Declaration order is report order.
    pub fn field(mut self, name: &'static str, rules: Vec<Rule>) -> Self {
        self.fields.push((name, rules));
        self
    }

    /// Run every rule against the (already sanitized) field map.
    ///
    /// Values are trimmed before evaluation; persistence later stores the
    /// trimmed form, so what is validated is what is kept.
    pub fn validate(&self, fields: &FieldMap) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for (name, rules) in &self.fields {
            let value = fields.get(*name).map(|v| v.trim()).unwrap_or("");

            for rule in rules {
                match rule {
                    Rule::Required => {
                        if value.is_empty() {
                            errors.push(FieldError::new(name, "is required", None));
                            break;
                        }
                    }
                    Rule::Length { min, max } => {
                        if value.is_empty() {
                            continue;
                        }
                        let len = value.chars().count();
                        if len < *min || len > *max {
                            errors.push(FieldError::new(
                                name,
                                format!("must be between {min} and {max} characters"),
                                Some(value),
                            ));
                        }
                    }
                    Rule::Pattern { re, hint } => {
                        if value.is_empty() {
                            continue;
                        }
                        if !re.is_match(value) {
                            errors.push(FieldError::new(name, *hint, Some(value)));
                        }
                    }
                    Rule::OneOf { allowed, hint } => {
                        if value.is_empty() {
                            continue;
                        }
                        if !allowed.contains(&value) {
                            errors.push(FieldError::new(name, *hint, Some(value)));
                        }
                    }
                }
            }
        }

        errors
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}
