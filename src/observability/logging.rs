//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Derive the default filter from configuration when `RUST_LOG` is unset
//!
//! # Design Decisions
//! - `RUST_LOG` always wins; the config level is the fallback so operators
//!   can raise verbosity without a redeploy

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(level: &str) -> String {
    if level == "off" {
        "off".to_string()
    } else {
        format!("forms_api={level},tower_http=info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_scope_the_crate() {
        assert_eq!(default_directives("debug"), "forms_api=debug,tower_http=info");
    }

    #[test]
    fn off_silences_everything() {
        assert_eq!(default_directives("off"), "off");
    }
}
