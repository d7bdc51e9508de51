// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	extract::rejection::JsonRejection,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use pvci_server_api::ErrorResponse;
use pvci_server_injector::ProvisionerError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Body could not be parsed.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error(transparent)]
	Provisioner(#[from] ProvisionerError),
}

impl From<JsonRejection> for ServerError {
	fn from(rejection: JsonRejection) -> Self {
		ServerError::BadRequest(rejection.body_text())
	}
}

impl ServerError {
	fn status_and_code(&self) -> (StatusCode, &'static str) {
		match self {
			ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
			ServerError::Provisioner(e) => match e {
				ProvisionerError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
				ProvisionerError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
				ProvisionerError::InProgress { .. } => (StatusCode::CONFLICT, "in_progress"),
				ProvisionerError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
				ProvisionerError::ObjectStore(_) => (StatusCode::BAD_GATEWAY, "object_store_error"),
				ProvisionerError::ClaimBoundTimeout { .. } | ProvisionerError::JobTimeout { .. } => {
					(StatusCode::GATEWAY_TIMEOUT, "timeout")
				}
				ProvisionerError::ClaimLost { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "claim_lost"),
				ProvisionerError::JobFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "job_failed"),
				ProvisionerError::K8s(_) => (StatusCode::INTERNAL_SERVER_ERROR, "kubernetes_error"),
				ProvisionerError::Aborted { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "aborted"),
			},
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, code) = self.status_and_code();
		if status.is_server_error() {
			tracing::error!(error = %self, code, "request failed");
		} else {
			tracing::warn!(error = %self, code, "request rejected");
		}
		(status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn status_of(err: ProvisionerError) -> StatusCode {
		ServerError::from(err).into_response().status()
	}

	#[test]
	fn provisioning_errors_map_to_status_codes() {
		assert_eq!(
			status_of(ProvisionerError::Validation("x".into())),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			status_of(ProvisionerError::Conflict { name: "a".into() }),
			StatusCode::CONFLICT
		);
		assert_eq!(
			status_of(ProvisionerError::InProgress { key: "ns/a".into() }),
			StatusCode::CONFLICT
		);
		assert_eq!(
			status_of(ProvisionerError::NotFound { name: "a".into() }),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			status_of(ProvisionerError::JobTimeout { name: "a".into() }),
			StatusCode::GATEWAY_TIMEOUT
		);
		assert_eq!(
			status_of(ProvisionerError::JobFailed { name: "a".into() }),
			StatusCode::INTERNAL_SERVER_ERROR
		);
		assert_eq!(
			status_of(ProvisionerError::Aborted {
				key: "ns/a".into(),
				message: "task panicked".into()
			}),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn bad_request_is_400() {
		let resp = ServerError::BadRequest("missing field".into()).into_response();
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}
}
