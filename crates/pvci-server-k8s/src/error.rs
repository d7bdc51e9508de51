// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Volume claim not found: {name}")]
	ClaimNotFound { name: String },

	#[error("Job not found: {name}")]
	JobNotFound { name: String },

	#[error("Persistent volume not found: {name}")]
	VolumeNotFound { name: String },

	#[error("Resource already exists: {name}")]
	AlreadyExists { name: String },

	#[error("Request rejected for {name}: {message}")]
	Rejected { name: String, message: String },
}

impl K8sError {
	/// True for any of the not-found variants.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			K8sError::ClaimNotFound { .. } | K8sError::JobNotFound { .. } | K8sError::VolumeNotFound { .. }
		)
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
