//! Run Progress Server
//!
//! Runs the progress lookup service as a standalone HTTP server.

use anyhow::Result;
use clap::Parser;
use run_progress::{
    ApiState, GoogleLogQuery, MetadataProjectResolver, DEFAULT_LOGGING_ENDPOINT,
    DEFAULT_METADATA_URL,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "run-progress-server")]
#[command(about = "HTTP service reporting the latest progress event for a run")]
struct Args {
    /// Server port
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Server host
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Project id override; skips the metadata-server project lookup
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    project_id: Option<String>,

    /// Metadata server base URL
    #[arg(long, default_value = DEFAULT_METADATA_URL, env = "METADATA_SERVER_URL")]
    metadata_url: String,

    /// Cloud Logging API base URL
    #[arg(long, default_value = DEFAULT_LOGGING_ENDPOINT, env = "LOGGING_ENDPOINT")]
    logging_endpoint: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("run_progress=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!("Starting Run Progress Server");
    info!("  Logging endpoint: {}", args.logging_endpoint);
    match &args.project_id {
        Some(project_id) => info!("  Project id: {} (from environment)", project_id),
        None => info!("  Project id: resolved via {}", args.metadata_url),
    }

    let resolver = MetadataProjectResolver::new(args.metadata_url, args.project_id)?;
    let log_query = GoogleLogQuery::new(args.logging_endpoint)?;

    let state = Arc::new(ApiState {
        resolver: Arc::new(resolver),
        log_query: Arc::new(log_query),
    });

    run_progress::run_server(state, &args.host, args.port).await
}
