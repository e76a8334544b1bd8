//! Persistence layer for the hosted backend.
//!
//! # Responsibilities
//! - Speak the backend's PostgREST dialect (insert-returning, rpc, select,
//!   exact counts, filtered updates, reachability probe)
//! - Classify policy denials so the gateway can fall back to the privileged
//!   insert procedure
//! - Expose entity-level operations with pagination for the admin surface
//!
//! # Design Decisions
//! - Two layers: `client` knows the wire, `gateway` knows the tables. Tests
//!   can exercise classification and pagination math without a network
//! - Every call carries explicit connect and total timeouts; the backend is
//!   remote and a hung socket must not hold a submission open

pub mod client;
pub mod gateway;

pub use client::{Credential, DbError, RestClient};
pub use gateway::{
    resolve_sort, CareerStats, ContactStats, Gateway, PageOf, Pagination, SortDir, StatusCount,
    CAREER_SORT_COLUMNS, CONTACT_SORT_COLUMNS,
};
