// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! PVCI server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pvci_object_store::S3ObjectStore;
use pvci_server::{create_app_state, create_router};
use pvci_server_k8s::KubeClient;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PVCI server - provisions volume claims populated from object storage.
#[derive(Parser, Debug)]
#[command(name = "pvci-server", about = "Persistent volume claim injection server", version)]
struct Args {
	/// Config file; defaults to /etc/pvci/server.toml
	#[arg(long, env = "PVCI_CONFIG")]
	config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => pvci_server_config::load_config_with_file(path)?,
		None => pvci_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		mode = %config.http.mode,
		"starting pvci-server"
	);

	let client = KubeClient::new().await?;
	let state = create_app_state(&config, Arc::new(client), Arc::new(S3ObjectStore::new()));

	let app = create_router(state)
		.layer(TimeoutLayer::new(config.http.request_timeout()))
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
