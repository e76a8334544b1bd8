//! Semantic validation of a loaded configuration.
//!
//! Parsing catches values that are not numbers or booleans; this pass catches
//! values that parse but cannot work, like an unroutable bind address or a
//! production deployment with no CORS allow-list. All violations are collected
//! so an operator fixes one restart's worth of mistakes, not one per restart.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{AppConfig, Environment, RateWindowConfig};

const MAX_UPLOAD_CEILING: usize = 50 * 1024 * 1024;
const MIN_ADMIN_KEY_LEN: usize = 16;

/// A single semantic violation, keyed by the configuration field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic errors, accumulating every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_addr.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_addr",
            format!("{:?} is not a valid socket address", config.server.bind_addr),
        ));
    }

    if !(1..=300).contains(&config.server.request_timeout_secs) {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be between 1 and 300",
        ));
    }

    if config.server.max_body_bytes < 1024 {
        errors.push(ValidationError::new(
            "server.max_body_bytes",
            "must be at least 1024",
        ));
    }

    for origin in &config.server.allowed_origins {
        if origin == "*" {
            if config.environment == Environment::Production {
                errors.push(ValidationError::new(
                    "server.allowed_origins",
                    "wildcard origin is not allowed in production",
                ));
            }
            continue;
        }
        if !is_http_url(origin) {
            errors.push(ValidationError::new(
                "server.allowed_origins",
                format!("{origin:?} is not an http(s) origin"),
            ));
        }
    }

    if config.environment == Environment::Production && config.server.allowed_origins.is_empty() {
        errors.push(ValidationError::new(
            "server.allowed_origins",
            "production requires an explicit origin allow-list",
        ));
    }

    if config.backend.url.is_empty() {
        errors.push(ValidationError::new("backend.url", "must be set"));
    } else if !is_http_url(&config.backend.url) {
        errors.push(ValidationError::new(
            "backend.url",
            format!("{:?} is not an http(s) URL", config.backend.url),
        ));
    }

    if config.backend.anon_key.trim().is_empty() {
        errors.push(ValidationError::new("backend.anon_key", "must be set"));
    }

    if !(1..=120).contains(&config.backend.timeout_secs) {
        errors.push(ValidationError::new(
            "backend.timeout_secs",
            "must be between 1 and 120",
        ));
    }

    if !(1..=60).contains(&config.backend.connect_timeout_secs) {
        errors.push(ValidationError::new(
            "backend.connect_timeout_secs",
            "must be between 1 and 60",
        ));
    }

    if config.storage.bucket.trim().is_empty() {
        errors.push(ValidationError::new("storage.bucket", "must be set"));
    }

    if !(1024..=MAX_UPLOAD_CEILING).contains(&config.storage.max_upload_bytes) {
        errors.push(ValidationError::new(
            "storage.max_upload_bytes",
            format!("must be between 1024 and {MAX_UPLOAD_CEILING}"),
        ));
    }

    validate_rate_window("contact_rate", &config.contact_rate, &mut errors);
    validate_rate_window("career_rate", &config.career_rate, &mut errors);

    if config.admin.enabled() && config.admin.api_key.len() < MIN_ADMIN_KEY_LEN {
        errors.push(ValidationError::new(
            "admin.api_key",
            format!("must be at least {MIN_ADMIN_KEY_LEN} characters"),
        ));
    }

    if !config.observability.metrics_addr.is_empty()
        && config.observability.metrics_addr.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_addr",
            format!(
                "{:?} is not a valid socket address",
                config.observability.metrics_addr
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rate_window(name: &str, rate: &RateWindowConfig, errors: &mut Vec<ValidationError>) {
    if rate.max_requests == 0 {
        errors.push(ValidationError::new(
            &format!("{name}.max_requests"),
            "must be at least 1",
        ));
    }
    if !(1..=86_400).contains(&rate.window_secs) {
        errors.push(ValidationError::new(
            &format!("{name}.window_secs"),
            "must be between 1 and 86400",
        ));
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
