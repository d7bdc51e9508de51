// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use kube::{
	api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams},
	Client,
};
use serde_json::json;
use tracing::{debug, instrument};

use crate::client::{ClaimPatch, Jobs, PersistentVolumes, VolumeClaims};
use crate::error::K8sError;
use crate::types::{Job, PersistentVolume, PersistentVolumeClaim};

/// Production K8s client implementation using the kube crate.
#[derive(Clone)]
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	pub async fn new() -> Result<Self, K8sError> {
		let client = Client::try_default().await?;
		debug!("K8s client initialized");
		Ok(Self { client })
	}
}

/// Map a create failure, distinguishing name collisions and rejected specs.
fn create_error(err: kube::Error, name: &str) -> K8sError {
	match err {
		kube::Error::Api(ref resp) if resp.code == 409 => K8sError::AlreadyExists { name: name.into() },
		kube::Error::Api(ref resp) if resp.code == 400 || resp.code == 422 => K8sError::Rejected {
			name: name.into(),
			message: resp.message.clone(),
		},
		e => e.into(),
	}
}

#[async_trait]
impl VolumeClaims for KubeClient {
	#[instrument(skip(self, claim), fields(claim = ?claim.metadata.name))]
	async fn create_claim(
		&self,
		namespace: &str,
		claim: PersistentVolumeClaim,
	) -> Result<PersistentVolumeClaim, K8sError> {
		let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
		let name = claim.metadata.name.clone().unwrap_or_default();
		claims
			.create(&PostParams::default(), &claim)
			.await
			.map_err(|e| create_error(e, &name))
	}

	async fn get_claim(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<PersistentVolumeClaim, K8sError> {
		let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
		match claims.get(name).await {
			Ok(claim) => Ok(claim),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::ClaimNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn delete_claim(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
		match claims.delete(name, &DeleteParams::default()).await {
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::ClaimNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn patch_claim(
		&self,
		name: &str,
		namespace: &str,
		patch: ClaimPatch,
	) -> Result<PersistentVolumeClaim, K8sError> {
		let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
		let body = match patch {
			ClaimPatch::RemoveFinalizer { index } => {
				let current = self.get_claim(name, namespace).await?;
				let mut finalizers = current.metadata.finalizers.unwrap_or_default();
				if index < finalizers.len() {
					finalizers.remove(index);
				}
				json!({ "metadata": { "finalizers": finalizers } })
			}
		};

		match claims
			.patch(name, &PatchParams::default(), &Patch::Merge(&body))
			.await
		{
			Ok(claim) => Ok(claim),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::ClaimNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}
}

#[async_trait]
impl Jobs for KubeClient {
	#[instrument(skip(self, job), fields(job = ?job.metadata.name))]
	async fn create_job(&self, namespace: &str, job: Job) -> Result<Job, K8sError> {
		let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
		let name = job.metadata.name.clone().unwrap_or_default();
		jobs
			.create(&PostParams::default(), &job)
			.await
			.map_err(|e| create_error(e, &name))
	}

	async fn get_job(&self, name: &str, namespace: &str) -> Result<Job, K8sError> {
		let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
		match jobs.get(name).await {
			Ok(job) => Ok(job),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::JobNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn list_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<Job>, K8sError> {
		let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
		let lp = ListParams::default().labels(label_selector);
		let job_list = jobs.list(&lp).await?;
		Ok(job_list.items)
	}

	#[instrument(skip(self))]
	async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
		match jobs.delete(name, &DeleteParams::background()).await {
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::JobNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}
}

#[async_trait]
impl PersistentVolumes for KubeClient {
	async fn get_volume(&self, name: &str) -> Result<PersistentVolume, K8sError> {
		let volumes: Api<PersistentVolume> = Api::all(self.client.clone());
		match volumes.get(name).await {
			Ok(pv) => Ok(pv),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::VolumeNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn set_volume_access_modes(
		&self,
		name: &str,
		access_modes: Vec<String>,
	) -> Result<PersistentVolume, K8sError> {
		let volumes: Api<PersistentVolume> = Api::all(self.client.clone());
		let body = json!({ "spec": { "accessModes": access_modes } });
		match volumes
			.patch(name, &PatchParams::default(), &Patch::Merge(&body))
			.await
		{
			Ok(pv) => Ok(pv),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::VolumeNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}
}
