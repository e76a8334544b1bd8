//! Configuration subsystem.
//!
//! # Responsibilities
//! - Define the typed configuration schema for the service
//! - Load configuration from environment variables with sane defaults
//! - Validate semantic correctness before the server starts
//! - Expose the active environment to code that renders responses
//!
//! # Design Decisions
//! - Environment variables only. The service runs on container platforms
//!   where config files are more trouble than they are worth; `.env` support
//!   for local work is handled at the binary entry point.
//! - Fail fast. A config that parses but cannot work stops the process at
//!   startup with every violation listed, never at first request.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{from_map, load_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, BackendConfig, Environment, ObservabilityConfig, RateWindowConfig,
    ServerConfig, StorageConfig,
};
pub use validation::{validate_config, ValidationError};

use std::sync::OnceLock;

static RUNTIME_ENV: OnceLock<Environment> = OnceLock::new();

/// Record the environment the process booted with. First call wins.
pub fn set_runtime_env(env: Environment) {
    let _ = RUNTIME_ENV.set(env);
}

/// The environment the process booted with, defaulting to development when
/// nothing was recorded (unit tests, mostly).
pub fn runtime_env() -> Environment {
    RUNTIME_ENV.get().copied().unwrap_or(Environment::Development)
}
