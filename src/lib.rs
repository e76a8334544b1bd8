//! Form-submission API for the marketing site.
//!
//! Two public flows (contact form, career application) share one pipeline:
//! rate limit → sanitize → validate → persist → envelope. Persistence is a
//! hosted PostgREST-style backend; resumes go to its companion object store.

// Request pipeline
pub mod forms;
pub mod http;
pub mod routes;
pub mod security;
pub mod validation;

// External services
pub mod db;
pub mod storage;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::{load_config, AppConfig};
pub use error::AppError;
pub use http::{ApiResponse, AppState, HttpServer};
