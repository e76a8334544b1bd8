//! Shared field patterns.
//!
//! Compiled once via `LazyLock` and referenced from the rule tables in
//! `crate::forms`. The email pattern checks shape only (local@domain.tld);
//! deliverability is not this service's problem.

use regex::Regex;
use std::sync::LazyLock;

/// RFC-shape email check. Case-insensitive; storage normalizes to lower-case.
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email regex should compile")
});

/// Phone-like contact string: optional leading `+`, 10-16 digits.
pub static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,16}$").expect("phone regex should compile"));

/// Person name: leading letter, then letters, spaces and `. , ' -`.
pub static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z .,'-]*$").expect("name regex should compile"));
