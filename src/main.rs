//! Commonpool Server Binary
//!
//! Loads configuration (file, environment, then CLI flags) and runs the
//! HTTP API.

use clap::Parser;
use commonpool::api::server::ApiServer;
use commonpool::config::ConfigLoader;
use commonpool::registry::GameRegistry;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "commonpool")]
#[command(about = "Commonpool Game Server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum game age in seconds before eviction
    #[arg(long)]
    max_age: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(origins) = args.cors_origins {
        config.api.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Some(timeout) = args.timeout {
        config.api.request_timeout_secs = timeout;
    }
    if let Some(max_age) = args.max_age {
        config.registry.max_age_secs = max_age;
    }

    let registry = Arc::new(GameRegistry::new(config.registry.clone()));
    let server = ApiServer::new(config, registry);
    server.run().await?;

    Ok(())
}
