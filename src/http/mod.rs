//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, global middleware, request IDs)
//!     → routes (rate limit → sanitize → validate → persist)
//!     → envelope.rs (uniform response shape)
//!     → Send to client
//! ```

pub mod envelope;
pub mod server;

pub use envelope::ApiResponse;
pub use server::{AppState, HttpServer, SetupError};
