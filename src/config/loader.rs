//! Configuration loading from the environment.
//!
//! Reads a snapshot of the process environment into a plain map first, so the
//! parsing path is a pure function of that map and unit tests never race on
//! process-global state.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::schema::{AppConfig, Environment, RateWindowConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// A variable is present but unparseable.
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    /// Semantic validation failed (all violations listed).
    Validation(Vec<ValidationError>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "{key}={value:?} is invalid: {reason}")
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    from_map(&vars)
}

/// Build a validated configuration from an environment snapshot.
pub fn from_map(vars: &HashMap<String, String>) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig {
        contact_rate: RateWindowConfig::contact_default(),
        career_rate: RateWindowConfig::career_default(),
        ..AppConfig::default()
    };

    if let Some(raw) = get(vars, "FORMS_ENV") {
        config.environment = Environment::parse(raw).ok_or_else(|| ConfigError::Invalid {
            key: "FORMS_ENV",
            value: raw.to_string(),
            reason: "expected development, production or test".to_string(),
        })?;
    }

    if let Some(addr) = get(vars, "FORMS_BIND_ADDR") {
        config.server.bind_addr = addr.to_string();
    }
    // Hosting platforms inject PORT; it wins over the configured address port.
    if let Some(raw) = get(vars, "PORT") {
        let port: u16 = parse_raw(raw, "PORT")?;
        config.server.bind_addr = format!("0.0.0.0:{port}");
    }

    if let Some(raw) = get(vars, "FORMS_ALLOWED_ORIGINS") {
        config.server.allowed_origins = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    config.server.request_timeout_secs =
        parse_or(vars, "REQUEST_TIMEOUT_SECS", config.server.request_timeout_secs)?;
    config.server.max_body_bytes = parse_or(vars, "MAX_BODY_BYTES", config.server.max_body_bytes)?;
    config.server.trust_proxy = parse_bool_or(vars, "TRUST_PROXY", config.server.trust_proxy)?;

    config.backend.url = get(vars, "SUPABASE_URL")
        .ok_or(ConfigError::Missing("SUPABASE_URL"))?
        .trim_end_matches('/')
        .to_string();
    config.backend.anon_key = get(vars, "SUPABASE_ANON_KEY")
        .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?
        .to_string();
    if let Some(key) = get(vars, "SUPABASE_SERVICE_ROLE_KEY") {
        config.backend.service_role_key = key.to_string();
    }
    config.backend.timeout_secs =
        parse_or(vars, "BACKEND_TIMEOUT_SECS", config.backend.timeout_secs)?;
    config.backend.connect_timeout_secs = parse_or(
        vars,
        "BACKEND_CONNECT_TIMEOUT_SECS",
        config.backend.connect_timeout_secs,
    )?;

    if let Some(bucket) = get(vars, "STORAGE_BUCKET") {
        config.storage.bucket = bucket.to_string();
    }
    config.storage.max_upload_bytes =
        parse_or(vars, "UPLOAD_MAX_BYTES", config.storage.max_upload_bytes)?;

    config.contact_rate.max_requests =
        parse_or(vars, "CONTACT_RATE_MAX", config.contact_rate.max_requests)?;
    config.contact_rate.window_secs =
        parse_or(vars, "CONTACT_RATE_WINDOW_SECS", config.contact_rate.window_secs)?;
    config.career_rate.max_requests =
        parse_or(vars, "CAREER_RATE_MAX", config.career_rate.max_requests)?;
    config.career_rate.window_secs =
        parse_or(vars, "CAREER_RATE_WINDOW_SECS", config.career_rate.window_secs)?;

    if let Some(key) = get(vars, "ADMIN_API_KEY") {
        config.admin.api_key = key.to_string();
    }

    if let Some(level) = get(vars, "LOG_LEVEL") {
        config.observability.log_level = level.to_string();
    }
    if let Some(addr) = get(vars, "METRICS_ADDR") {
        config.observability.metrics_addr = addr.to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Trimmed, non-empty lookup.
fn get<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_raw<T>(raw: &str, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(vars: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(vars, key) {
        Some(raw) => parse_raw(raw, key),
        None => Ok(default),
    }
}

fn parse_bool_or(
    vars: &HashMap<String, String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(vars, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value: raw.to_string(),
                reason: "expected a boolean".to_string(),
            }),
        },
        None => Ok(default),
    }
}
