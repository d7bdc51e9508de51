// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Service info and health handlers.

use axum::{extract::State, Json};
use pvci_server_api::{HealthResponse, InfoResponse};

use crate::api::AppState;

/// GET / - Version, run mode and service name.
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
	let config = state.provisioner.config();
	Json(InfoResponse {
		version: config.version.clone(),
		mode: state.mode.to_string(),
		service: config.service.clone(),
	})
}

/// GET /health - Liveness check.
pub async fn health() -> Json<HealthResponse> {
	Json(HealthResponse::ok())
}
