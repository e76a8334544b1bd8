//! Form definitions for the two public submission flows.
//!
//! # Responsibilities
//! - Wire payload shapes and their field maps
//! - Per-form rule tables consumed by the validation engine
//! - Normalization into the records the persistence gateway inserts
//! - Fixed code sets (positions, experience ranges, qualifications, statuses)
//! - Reference-number derivation (`CNT-...`, `APP-...`)
//!
//! # Design Decisions
//! - One `build_*` entry point per form runs validate-then-normalize, so a
//!   handler cannot persist an unvalidated record
//! - Records serialize with database column names; rows serialize back to the
//!   wire in camelCase

pub mod career;
pub mod contact;

pub use career::{
    application_number, build_application, position_catalog, ApplicationStatus, CareerRow,
    ExperienceRange, NewCareerApplication, Position, PositionOption, Qualification, ResumeRef,
};
pub use contact::{build_contact, contact_reference, ContactPayload, ContactRow, NewContact};
