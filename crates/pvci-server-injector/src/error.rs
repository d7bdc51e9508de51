// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioner error types.

/// Errors that can occur during provisioning operations.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionerError {
	/// Malformed request
	#[error("Invalid request: {0}")]
	Validation(String),

	/// A claim with the target or staging name already exists
	#[error("Volume claim already exists: {name}")]
	Conflict { name: String },

	/// A workflow for this target is still running in this process
	#[error("Provisioning already in progress: {key}")]
	InProgress { key: String },

	/// Named resource does not exist
	#[error("Not found: {name}")]
	NotFound { name: String },

	/// Object-store listing failed
	#[error(transparent)]
	ObjectStore(#[from] pvci_object_store::ObjectStoreError),

	/// Kubernetes error
	#[error(transparent)]
	K8s(#[from] pvci_server_k8s::K8sError),

	/// Claim never reached Bound
	#[error("Volume claim {name} did not become bound in allotted time")]
	ClaimBoundTimeout { name: String },

	/// Claim reached Lost while waiting for Bound
	#[error("Volume claim {name} was lost")]
	ClaimLost { name: String },

	/// Copy job reported a failed pod
	#[error("job failed")]
	JobFailed { name: String },

	/// Copy job did not finish within its estimated budget
	#[error("job is unable to complete in allotted time")]
	JobTimeout { name: String },

	/// The task driving a run panicked or was cancelled by runtime shutdown
	#[error("Provisioning run for {key} aborted: {message}")]
	Aborted { key: String, message: String },
}

impl ProvisionerError {
	pub fn is_timeout(&self) -> bool {
		matches!(
			self,
			ProvisionerError::ClaimBoundTimeout { .. } | ProvisionerError::JobTimeout { .. }
		)
	}
}
