// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{Job, PersistentVolume, PersistentVolumeClaim};

/// Minimal patch operations applied to a volume claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimPatch {
	/// Drop the finalizer at the given index so a pending delete can complete.
	RemoveFinalizer { index: usize },
}

/// Volume claim operations.
///
/// None of these retry; callers own the retry policy.
#[async_trait]
pub trait VolumeClaims: Send + Sync {
	/// Create a claim in the specified namespace.
	async fn create_claim(
		&self,
		namespace: &str,
		claim: PersistentVolumeClaim,
	) -> Result<PersistentVolumeClaim, K8sError>;

	/// Get a claim by name. A missing claim is `K8sError::ClaimNotFound`.
	async fn get_claim(&self, name: &str, namespace: &str)
		-> Result<PersistentVolumeClaim, K8sError>;

	/// Delete a claim by name. A missing claim is `K8sError::ClaimNotFound`.
	async fn delete_claim(&self, name: &str, namespace: &str) -> Result<(), K8sError>;

	/// Apply a minimal patch to a claim.
	async fn patch_claim(
		&self,
		name: &str,
		namespace: &str,
		patch: ClaimPatch,
	) -> Result<PersistentVolumeClaim, K8sError>;
}

/// Copy job operations.
#[async_trait]
pub trait Jobs: Send + Sync {
	/// Create a job in the specified namespace.
	async fn create_job(&self, namespace: &str, job: Job) -> Result<Job, K8sError>;

	/// Get a job by name. A missing job is `K8sError::JobNotFound`.
	async fn get_job(&self, name: &str, namespace: &str) -> Result<Job, K8sError>;

	/// List jobs in a namespace matching the given label selector.
	async fn list_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<Job>, K8sError>;

	/// Delete a job by name with background propagation, so its pods are
	/// garbage collected by the cluster.
	async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), K8sError>;
}

/// Cluster-scoped persistent volume operations.
#[async_trait]
pub trait PersistentVolumes: Send + Sync {
	async fn get_volume(&self, name: &str) -> Result<PersistentVolume, K8sError>;

	/// Replace `spec.accessModes` on a bound volume.
	async fn set_volume_access_modes(
		&self,
		name: &str,
		access_modes: Vec<String>,
	) -> Result<PersistentVolume, K8sError>;
}

/// The full capability set the provisioner needs from the cluster.
///
/// Implemented automatically for anything that provides every capability.
pub trait K8sClient: VolumeClaims + Jobs + PersistentVolumes {}

impl<T> K8sClient for T where T: VolumeClaims + Jobs + PersistentVolumes {}
