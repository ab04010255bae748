use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use dotenv::dotenv;

use sftp_bridge::configure;
use sftp_bridge::gateway::{create_app, AppState};
use sftp_bridge::logger::setup_logger;
use sftp_bridge::registry::ProjectRegistry;
use sftp_bridge::remote::SftpGateway;
use sftp_bridge::transfer::TransferEngine;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the project registry JSON file
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<String>,

    /// HTTP listen port, overrides server_port from the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let path = configure::config_path(args.config.as_deref());
    let mut config = configure::load_config(&path)
        .with_context(|| format!("Failed to load config from {}", path))?;
    if let Some(port) = args.port {
        config.server_port = port;
    }

    setup_logger(&config).map_err(|e| anyhow!("Failed to set up logging: {}", e))?;

    let registry = Arc::new(ProjectRegistry::from_config(&config));
    log::info!("Starting HTTP server on port {}", config.server_port);
    log::info!("Registered {} projects", registry.len());
    for name in registry.names() {
        log::info!("  - {}", name);
    }

    let engine = Arc::new(TransferEngine::new(registry, Arc::new(SftpGateway::new())));
    let app = create_app(Arc::new(AppState::new(engine)));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
