//! # stagegate
//!
//! The main binary for the stagegate writing-workflow engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for project and stage operations
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/stagegate (THE BINARY)        │
//! │                                               │
//! │   ┌─────────────┐         ┌─────────────┐     │
//! │   │    CLI      │         │  HTTP API   │     │
//! │   │   (clap)    │         │   (axum)    │     │
//! │   └──────┬──────┘         └──────┬──────┘     │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │             ┌────────────────┐                │
//! │             │ stagegate-core │                │
//! │             │  (THE ENGINE)  │                │
//! │             └────────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! stagegate server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! stagegate new --title "On Rivers" --mode essay
//! stagegate write -p 1 -s thesis_statement -f thesis.txt
//! stagegate check -p 1 -s thesis_statement
//! ```

use clap::Parser;
use stagegate::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // STAGEGATE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STAGEGATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stagegate=info,stagegate_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the stagegate startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌┬┐┌─┐┌─┐┌─┐┌─┐┌─┐┌┬┐┌─┐
  └─┐ │ ├─┤│ ┬├┤ │ ┬├─┤ │ ├┤
  └─┘ ┴ ┴ ┴└─┘└─┘└─┘┴ ┴ ┴ └─┘

  Gated writing workflows v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
