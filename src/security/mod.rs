//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming submission:
//!     → rate_limit.rs (per-client window check)
//!     → sanitize.rs (strip script-like constructs)
//!     → [validation layer decides accept/reject]
//! ```
//!
//! # Design Decisions
//! - Fail closed: over-ceiling requests never reach a handler
//! - Sanitization is narrow and runs before validation, so rules evaluate
//!   what would actually be stored

pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::{rate_limit_middleware, RateDecision, RateLimiter};
pub use sanitize::{escape_html, sanitize_fields, sanitize_str};
