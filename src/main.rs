//! Forms API server entry point.
//!
//! Startup order: CLI arguments, `.env`, configuration (load + validate),
//! logging, optional metrics exporter, then the listener. Any startup error
//! is fatal; a config that cannot work must never reach traffic.

use clap::Parser;
use tokio::net::TcpListener;

use forms_api::config::{self, load_config};
use forms_api::http::HttpServer;
use forms_api::observability::{logging, metrics};

/// Submission API behind the marketing site's contact and careers forms.
#[derive(Parser, Debug)]
#[command(name = "forms-api")]
#[command(about = "Form-submission API for the marketing site", long_about = None)]
struct Args {
    /// Path to a .env file loaded before configuration.
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
    }

    let config = load_config()?;
    logging::init(&config.observability);
    config::set_runtime_env(config.environment);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        bind_addr = %config.server.bind_addr,
        backend = %config.backend.url,
        admin_enabled = config.admin.enabled(),
        "configuration loaded"
    );

    if !config.observability.metrics_addr.is_empty() {
        // Validation already checked the address parses.
        if let Ok(addr) = config.observability.metrics_addr.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
