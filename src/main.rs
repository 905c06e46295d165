//! `bank-gateway` server binary.
//!
//! Usage:
//!   bank-gateway --config <path> [--listen <addr>]

// std
use std::path::PathBuf;
// crates.io
use anyhow::Context;
use bank_gateway::server::{self, AppState, GatewayConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Banking aggregation gateway.
#[derive(Debug, Parser)]
#[command(name = "bank-gateway", version, about)]
struct Cli {
	/// Path to the TOML configuration file.
	#[arg(short = 'c', long, env = "BANK_GATEWAY_CONFIG", default_value = "bank-gateway.toml")]
	config: PathBuf,
	/// Listen address; overrides `server.listen`.
	#[arg(long)]
	listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = GatewayConfig::from_file(&cli.config)
		.with_context(|| format!("failed to load {}", cli.config.display()))?;

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new(&config.server.log_filter)),
		)
		.init();

	let listen = cli.listen.unwrap_or_else(|| config.server.listen.clone());
	let cors = server::cors_layer(&config.server.cors_origin)?;
	let state = AppState::from_config(&config).await?;

	tracing::info!(partner = %state.gateway.descriptor().id, "Partner gateway configured.");

	let app = server::build_router(state, cors);
	let listener = tokio::net::TcpListener::bind(&listen)
		.await
		.with_context(|| format!("failed to bind {listen}"))?;

	tracing::info!(%listen, "bank-gateway listening.");

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	tracing::info!("bank-gateway stopped.");

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal.");
	}
}
