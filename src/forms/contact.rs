//! Contact form: wire payload, rule table and the persisted record.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::security::escape_html;
use crate::validation::patterns::{EMAIL_RE, NAME_RE, PHONE_RE};
use crate::validation::{FieldError, FieldMap, Rule, RuleSet};

/// Raw body of `POST /api/contact`.
///
/// Every field defaults to empty so a missing key reaches the validator as an
/// empty string and comes back as a field error, not a deserializer reject.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactPayload {
    pub full_name: String,
    pub email: String,
    pub contact: String,
    pub message: String,
}

impl ContactPayload {
    /// Field map keyed by the wire names violations are reported against.
    pub fn into_fields(self) -> FieldMap {
        FieldMap::from([
            ("fullName".to_string(), self.full_name),
            ("email".to_string(), self.email),
            ("contact".to_string(), self.contact),
            ("message".to_string(), self.message),
        ])
    }
}

/// Rule table for a contact submission, in report order.
pub static CONTACT_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(
            "fullName",
            vec![
                Rule::Required,
                Rule::Length { min: 2, max: 255 },
                Rule::Pattern {
                    re: &NAME_RE,
                    hint: "may only contain letters, spaces and . , ' -",
                },
            ],
        )
        .field(
            "email",
            vec![
                Rule::Required,
                Rule::Length { min: 3, max: 255 },
                Rule::Pattern {
                    re: &EMAIL_RE,
                    hint: "must be a valid email address",
                },
            ],
        )
        .field(
            "contact",
            vec![
                Rule::Required,
                Rule::Pattern {
                    re: &PHONE_RE,
                    hint: "must be 10 to 16 digits, optionally starting with +",
                },
            ],
        )
        .field(
            "message",
            vec![Rule::Required, Rule::Length { min: 10, max: 2000 }],
        )
});

/// Insert body for the `contact_submissions` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewContact {
    pub full_name: String,
    pub email: String,
    pub contact: String,
    pub message: String,
}

/// Validate sanitized fields and build the normalized record.
///
/// Normalization: all values trimmed, email lower-cased, message
/// entity-escaped. What is validated is what gets stored.
pub fn build_contact(fields: &FieldMap) -> Result<NewContact, Vec<FieldError>> {
    let errors = CONTACT_RULES.validate(fields);
    if !errors.is_empty() {
        return Err(errors);
    }

    let value = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or("");
    Ok(NewContact {
        full_name: value("fullName").to_string(),
        email: value("email").to_lowercase(),
        contact: value("contact").to_string(),
        message: escape_html(value("message")),
    })
}

/// Row shape the backend returns for `contact_submissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct ContactRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub contact: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Human-readable reference handed back to the submitter, derived from the id.
pub fn contact_reference(id: i64) -> String {
    format!("CNT-{id:06}")
}
