//! Trace logger demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request (traceparent?)
//!     ──────────────────────────────▶ TraceContextLayer ──▶ TraceLayer ──▶ handler
//!                                         │                                 │
//!                                         │ enter scope                     │ tracing::info!(...)
//!                                         ▼                                 ▼
//!                                    TraceScopes ◀── ProjectResolver   EnrichedFormat
//!                                    (traceparent, record)             (scope fields merged)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use trace_logger::config::{load_config, AppConfig};
use trace_logger::{init_logging, HttpServer, ProjectResolver, TraceScopes};

#[derive(Parser)]
#[command(name = "trace-logger")]
#[command(about = "Demo server emitting trace-enriched structured logs", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = AppConfig::default();
            config.apply_env();
            config
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    init_logging(&config.logging)?;

    tracing::info!("trace-logger v{} starting", env!("CARGO_PKG_VERSION"));

    let resolver = Arc::new(ProjectResolver::new(config.project.clone()));
    let scopes = TraceScopes::new(resolver.clone());

    // Warm the cache so the first request does not pay for the lookup.
    let project_id = resolver.resolve().await;
    tracing::info!(
        bind_address = %config.server.bind_address,
        project_id = project_id.as_deref().unwrap_or("<none>"),
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(config, scopes);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
