//! Career application form: code sets, rule table and the persisted record.
//!
//! The three code sets (position, experience range, qualification) are fixed
//! enumerations. The wire carries their kebab-case values; the same values are
//! what the membership rule checks and what the backend stores, so the enum
//! definitions here are the single source of truth.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::security::escape_html;
use crate::validation::patterns::{EMAIL_RE, NAME_RE, PHONE_RE};
use crate::validation::{FieldError, FieldMap, Rule, RuleSet};

/// Openings applicants can apply for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "software-engineer")]
    SoftwareEngineer,
    #[serde(rename = "product-designer")]
    ProductDesigner,
    #[serde(rename = "sales-executive")]
    SalesExecutive,
    #[serde(rename = "marketing-specialist")]
    MarketingSpecialist,
    #[serde(rename = "support-engineer")]
    SupportEngineer,
    #[serde(rename = "operations-manager")]
    OperationsManager,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::SoftwareEngineer,
        Position::ProductDesigner,
        Position::SalesExecutive,
        Position::MarketingSpecialist,
        Position::SupportEngineer,
        Position::OperationsManager,
    ];

    /// Wire values, for the set-membership rule.
    pub const VALUES: &'static [&'static str] = &[
        "software-engineer",
        "product-designer",
        "sales-executive",
        "marketing-specialist",
        "support-engineer",
        "operations-manager",
    ];

    pub fn value(&self) -> &'static str {
        match self {
            Position::SoftwareEngineer => "software-engineer",
            Position::ProductDesigner => "product-designer",
            Position::SalesExecutive => "sales-executive",
            Position::MarketingSpecialist => "marketing-specialist",
            Position::SupportEngineer => "support-engineer",
            Position::OperationsManager => "operations-manager",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Position::SoftwareEngineer => "Software Engineer",
            Position::ProductDesigner => "Product Designer",
            Position::SalesExecutive => "Sales Executive",
            Position::MarketingSpecialist => "Marketing Specialist",
            Position::SupportEngineer => "Customer Support Engineer",
            Position::OperationsManager => "Operations Manager",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.value() == value)
    }
}

/// Years-of-experience brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceRange {
    #[serde(rename = "0-1")]
    ZeroToOne,
    #[serde(rename = "1-3")]
    OneToThree,
    #[serde(rename = "3-5")]
    ThreeToFive,
    #[serde(rename = "5-10")]
    FiveToTen,
    #[serde(rename = "10+")]
    TenPlus,
}

impl ExperienceRange {
    pub const ALL: [ExperienceRange; 5] = [
        ExperienceRange::ZeroToOne,
        ExperienceRange::OneToThree,
        ExperienceRange::ThreeToFive,
        ExperienceRange::FiveToTen,
        ExperienceRange::TenPlus,
    ];

    pub const VALUES: &'static [&'static str] = &["0-1", "1-3", "3-5", "5-10", "10+"];

    pub fn value(&self) -> &'static str {
        match self {
            ExperienceRange::ZeroToOne => "0-1",
            ExperienceRange::OneToThree => "1-3",
            ExperienceRange::ThreeToFive => "3-5",
            ExperienceRange::FiveToTen => "5-10",
            ExperienceRange::TenPlus => "10+",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.value() == value)
    }
}

/// Highest completed qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Qualification {
    HighSchool,
    Diploma,
    Bachelors,
    Masters,
    Doctorate,
    Other,
}

impl Qualification {
    pub const ALL: [Qualification; 6] = [
        Qualification::HighSchool,
        Qualification::Diploma,
        Qualification::Bachelors,
        Qualification::Masters,
        Qualification::Doctorate,
        Qualification::Other,
    ];

    pub const VALUES: &'static [&'static str] = &[
        "high-school",
        "diploma",
        "bachelors",
        "masters",
        "doctorate",
        "other",
    ];

    pub fn value(&self) -> &'static str {
        match self {
            Qualification::HighSchool => "high-school",
            Qualification::Diploma => "diploma",
            Qualification::Bachelors => "bachelors",
            Qualification::Masters => "masters",
            Qualification::Doctorate => "doctorate",
            Qualification::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.value() == value)
    }
}

/// Review pipeline state of an application. Only the admin status-update
/// operation moves an application out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewing,
    Shortlisted,
    Interviewed,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Rule table for a career application, in report order.
pub static CAREER_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
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
            "phone",
            vec![
                Rule::Required,
                Rule::Pattern {
                    re: &PHONE_RE,
                    hint: "must be 10 to 16 digits, optionally starting with +",
                },
            ],
        )
        .field(
            "location",
            vec![Rule::Required, Rule::Length { min: 2, max: 255 }],
        )
        .field(
            "position",
            vec![
                Rule::Required,
                Rule::OneOf {
                    allowed: Position::VALUES,
                    hint: "is not an open position",
                },
            ],
        )
        .field(
            "experience",
            vec![
                Rule::Required,
                Rule::OneOf {
                    allowed: ExperienceRange::VALUES,
                    hint: "is not a recognized experience range",
                },
            ],
        )
        .field(
            "qualification",
            vec![
                Rule::Required,
                Rule::OneOf {
                    allowed: Qualification::VALUES,
                    hint: "is not a recognized qualification",
                },
            ],
        )
        .field("coverLetter", vec![Rule::Length { min: 1, max: 2000 }])
        .field(
            "consent",
            vec![
                Rule::Required,
                Rule::OneOf {
                    allowed: &["true"],
                    hint: "must be granted to submit an application",
                },
            ],
        )
});

/// Public reference to an uploaded resume, attached after storage succeeds.
#[derive(Debug, Clone)]
pub struct ResumeRef {
    pub url: String,
    pub filename: String,
}

/// Insert body for the `career_applications` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewCareerApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub position: Position,
    pub experience: ExperienceRange,
    pub qualification: Qualification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_filename: Option<String>,
    pub consent: bool,
    pub application_status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Validate sanitized fields and build the normalized record.
///
/// The code-set parses after a passed `OneOf` cannot miss; the error arms
/// exist so a rule-table edit that forgets a value shows up as a 400, not a
/// panic.
pub fn build_application(
    fields: &FieldMap,
    resume: Option<ResumeRef>,
) -> Result<NewCareerApplication, Vec<FieldError>> {
    let errors = CAREER_RULES.validate(fields);
    if !errors.is_empty() {
        return Err(errors);
    }

    let value = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or("");

    let position = Position::parse(value("position")).ok_or_else(|| {
        vec![FieldError::new(
            "position",
            "is not an open position",
            Some(value("position")),
        )]
    })?;
    let experience = ExperienceRange::parse(value("experience")).ok_or_else(|| {
        vec![FieldError::new(
            "experience",
            "is not a recognized experience range",
            Some(value("experience")),
        )]
    })?;
    let qualification = Qualification::parse(value("qualification")).ok_or_else(|| {
        vec![FieldError::new(
            "qualification",
            "is not a recognized qualification",
            Some(value("qualification")),
        )]
    })?;

    let cover_letter = match value("coverLetter") {
        "" => None,
        text => Some(escape_html(text)),
    };
    let (resume_url, resume_filename) = match resume {
        Some(r) => (Some(r.url), Some(r.filename)),
        None => (None, None),
    };

    Ok(NewCareerApplication {
        full_name: value("fullName").to_string(),
        email: value("email").to_lowercase(),
        phone: value("phone").to_string(),
        location: value("location").to_string(),
        position,
        experience,
        qualification,
        cover_letter,
        resume_url,
        resume_filename,
        consent: true, // unreachable otherwise: the consent rule admits only "true"
        application_status: ApplicationStatus::Pending,
        applied_at: Utc::now(),
    })
}

/// Row shape the backend returns for `career_applications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct CareerRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub position: Position,
    pub experience: ExperienceRange,
    pub qualification: Qualification,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub resume_filename: Option<String>,
    pub consent: bool,
    pub application_status: ApplicationStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Human-readable application number derived from the id.
pub fn application_number(id: i64) -> String {
    format!("APP-{id:06}")
}

/// One entry of the public positions catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PositionOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// The catalog served by `GET /api/careers/positions`.
pub fn position_catalog() -> Vec<PositionOption> {
    Position::ALL
        .iter()
        .map(|p| PositionOption {
            value: p.value(),
            label: p.label(),
        })
        .collect()
}
