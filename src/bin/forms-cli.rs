//! Operations CLI for the forms API.
//!
//! Drives the health endpoints and the Bearer-gated admin surface from the
//! command line; output is the service's JSON, pretty-printed.

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "forms-cli")]
#[command(about = "Operations CLI for the forms API", long_about = None)]
struct Cli {
    /// Base URL of a running forms-api instance.
    #[arg(short, long, default_value = "http://localhost:8080", env = "FORMS_API_URL")]
    url: String,

    /// Admin Bearer key; only admin subcommands need it.
    #[arg(short, long, default_value = "", env = "ADMIN_API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service and backend health
    Health,
    /// Probe backend connectivity
    Test,
    /// List contact submissions (admin)
    Contacts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// List career applications (admin)
    Careers {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show submission statistics (admin)
    Stats,
    /// Move a career application to a new status (admin)
    SetStatus {
        /// Application id
        id: i64,
        /// pending, reviewing, shortlisted, interviewed, hired or rejected
        status: String,
        /// Replace the reviewer notes
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/api/contact/health", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Test => {
            let res = client
                .get(format!("{}/api/contact/test", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Contacts { page, limit } => {
            let res = client
                .get(format!("{}/api/admin/contact", cli.url))
                .query(&[("page", page), ("limit", limit)])
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Careers { page, limit } => {
            let res = client
                .get(format!("{}/api/admin/careers", cli.url))
                .query(&[("page", page), ("limit", limit)])
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stats => {
            let contact = client
                .get(format!("{}/api/admin/contact/stats", cli.url))
                .headers(headers.clone())
                .send()
                .await?;
            print_response(contact).await?;
            let careers = client
                .get(format!("{}/api/admin/careers/stats", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(careers).await?;
        }
        Commands::SetStatus { id, status, notes } => {
            let mut body = json!({ "status": status });
            if let Some(notes) = notes {
                body["notes"] = Value::String(notes);
            }
            let res = client
                .patch(format!("{}/api/admin/careers/{}/status", cli.url, id))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
