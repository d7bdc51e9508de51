// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use pvci_object_store::ObjectStore;
use pvci_server_config::{InjectorConfig, ServerConfig, ServerMode};
use pvci_server_injector::{Provisioner, ProvisionerConfig};
use pvci_server_k8s::K8sClient;

use crate::routes;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
	pub provisioner: Arc<Provisioner>,
	pub mode: ServerMode,
}

/// Provisioner settings from the `[injector]` config section.
pub fn provisioner_config(injector: &InjectorConfig) -> ProvisionerConfig {
	ProvisionerConfig {
		volume_overage_percent: injector.volume_overage_percent,
		avg_mbps: injector.avg_mbps,
		mc_image: injector.mc_image.clone(),
		job_ttl_secs: injector.job_ttl_secs,
		..ProvisionerConfig::default()
	}
}

pub fn create_app_state(
	config: &ServerConfig,
	client: Arc<dyn K8sClient>,
	object_store: Arc<dyn ObjectStore>,
) -> AppState {
	let provisioner = Provisioner::new(client, object_store, provisioner_config(&config.injector));
	AppState {
		provisioner: Arc::new(provisioner),
		mode: config.http.mode,
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::service::info))
		.route("/health", get(routes::service::health))
		.route("/size", post(routes::provisioning::size))
		.route("/create", post(routes::provisioning::create))
		.route("/create-async", post(routes::provisioning::create_async))
		.route("/status", post(routes::provisioning::status))
		.route("/delete", post(routes::provisioning::delete))
		.route("/cleanup", post(routes::provisioning::cleanup))
		.route("/mode/rox", post(routes::provisioning::mode_rox))
		.route("/mode/rwo", post(routes::provisioning::mode_rwo))
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn provisioner_config_takes_injector_section() {
		let injector = InjectorConfig {
			volume_overage_percent: 40,
			avg_mbps: 50,
			mc_image: "minio/mc:latest".into(),
			job_ttl_secs: 30,
		};
		let config = provisioner_config(&injector);
		assert_eq!(config.volume_overage_percent, 40);
		assert_eq!(config.avg_mbps, 50);
		assert_eq!(config.mc_image, "minio/mc:latest");
		assert_eq!(config.job_ttl_secs, 30);
		assert_eq!(config.service, "pvci");
	}
}
