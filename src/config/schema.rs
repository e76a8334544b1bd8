//! Configuration schema definitions.
//!
//! The complete configuration structure for the service. Values come from
//! environment variables (see `loader`); every field has a default so a
//! development instance needs nothing beyond the backend URL and key.

use std::fmt;

/// Deployment environment. Drives CORS strictness and error-detail exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for the forms service.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// Listener and request-shaping settings.
    pub server: ServerConfig,

    /// Remote backend (database API) connection.
    pub backend: BackendConfig,

    /// Resume object-storage settings.
    pub storage: StorageConfig,

    /// Contact-form rate window.
    pub contact_rate: RateWindowConfig,

    /// Career-form rate window.
    pub career_rate: RateWindowConfig,

    /// Admin surface settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Allowed cross-origin hosts. Empty list means permissive in
    /// development and is rejected by validation in production.
    pub allowed_origins: Vec<String>,

    /// Total inbound request timeout in seconds.
    pub request_timeout_secs: u64,

    /// JSON body ceiling in bytes.
    pub max_body_bytes: usize,

    /// Honor `X-Forwarded-For` when resolving client addresses.
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            allowed_origins: Vec::new(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
            trust_proxy: true,
        }
    }
}

/// Remote backend connection (PostgREST-style API over HTTPS).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted backend (e.g., "https://xyz.supabase.co").
    pub url: String,

    /// Public credential used for direct inserts and the reachability probe.
    pub anon_key: String,

    /// Privileged credential for the stored-procedure fallback, storage
    /// writes and admin reads. Empty disables the fallback.
    pub service_role_key: String,

    /// Total outbound request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            service_role_key: String::new(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Object-storage settings for resume uploads.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket/namespace holding uploaded resumes.
    pub bucket: String,

    /// Per-file size ceiling in bytes.
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "resumes".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

/// One flow's rate-limit window.
#[derive(Debug, Clone)]
pub struct RateWindowConfig {
    /// Maximum admitted requests per client per window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateWindowConfig {
    pub fn contact_default() -> Self {
        Self {
            max_requests: 3,
            window_secs: 15 * 60,
        }
    }

    pub fn career_default() -> Self {
        Self {
            max_requests: 3,
            window_secs: 60 * 60,
        }
    }
}

impl Default for RateWindowConfig {
    fn default() -> Self {
        Self::contact_default()
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    /// Bearer key guarding `/api/admin/*`. Empty leaves the admin routes
    /// unmounted entirely.
    pub api_key: String,
}

impl AdminConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset ("off" silences).
    pub log_level: String,

    /// Prometheus exporter bind address; empty disables the exporter.
    pub metrics_addr: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_addr: String::new(),
        }
    }
}
