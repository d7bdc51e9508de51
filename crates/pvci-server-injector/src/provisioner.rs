// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning workflow: staging claim, copy job, read-only clone.

use std::sync::Arc;

use pvci_object_store::{ObjectStore, S3Source, SizeSummary};
use pvci_server_k8s::{ClaimPatch, K8sClient, K8sError, PHASE_BOUND, PHASE_LOST};
use tracing::{error, info, instrument, warn};

use crate::backoff::{BackoffPoller, PollResult, Probe};
use crate::config::ProvisionerConfig;
use crate::error::ProvisionerError;
use crate::manifests::{
	build_copy_job, build_final_claim, build_staging_claim, job_name, staging_claim_name,
};
use crate::sizing::{
	estimated_runtime_seconds, job_completion_attempts, requested_capacity, SizeEstimator,
};
use crate::status::{StatusReport, StatusReporter};
use crate::tracker::{RunMode, WorkflowStage, WorkflowTracker};
use crate::types::{
	validate_source, AccessMode, ProvisioningOutcome, ProvisioningRequest, TargetRef,
};

/// Drives provisioning runs and the operations around them.
pub struct Provisioner {
	client: Arc<dyn K8sClient>,
	estimator: SizeEstimator,
	reporter: StatusReporter,
	tracker: WorkflowTracker,
	config: ProvisionerConfig,
}

impl Provisioner {
	pub fn new(
		client: Arc<dyn K8sClient>,
		object_store: Arc<dyn ObjectStore>,
		config: ProvisionerConfig,
	) -> Self {
		Self {
			estimator: SizeEstimator::new(object_store),
			reporter: StatusReporter::new(client.clone()),
			tracker: WorkflowTracker::new(),
			client,
			config,
		}
	}

	pub fn config(&self) -> &ProvisionerConfig {
		&self.config
	}

	pub fn tracker(&self) -> &WorkflowTracker {
		&self.tracker
	}

	/// Object count and total size under the source prefix.
	pub async fn size(&self, source: &S3Source) -> Result<SizeSummary, ProvisionerError> {
		validate_source(source)?;
		self.estimator.summarize(source).await
	}

	/// Run the whole workflow and return once it has finished or failed.
	///
	/// Admission and the run happen on a spawned task: dropping the returned
	/// future does not cancel them, and the run's record is always finished.
	pub async fn create(
		self: &Arc<Self>,
		req: ProvisioningRequest,
	) -> Result<ProvisioningOutcome, ProvisionerError> {
		let key = req.target.key();
		let provisioner = Arc::clone(self);
		tokio::spawn(async move {
			provisioner.admit(&req, RunMode::Sync).await?;
			provisioner.execute(req).await
		})
		.await
		.map_err(|e| ProvisionerError::Aborted {
			key,
			message: e.to_string(),
		})?
	}

	/// Start the workflow as a background task and return once it has been
	/// admitted.
	///
	/// Request validation and the existence checks happen before returning.
	/// The outcome is only observable through [`Provisioner::status`] and the
	/// logs.
	pub async fn create_async(
		self: &Arc<Self>,
		req: ProvisioningRequest,
	) -> Result<(), ProvisionerError> {
		let key = req.target.key();
		let provisioner = Arc::clone(self);
		tokio::spawn(async move {
			provisioner.admit(&req, RunMode::Async).await?;

			let target = req.target.clone();
			tokio::spawn(async move {
				if let Err(e) = provisioner.execute(req).await {
					error!(
						namespace = %target.namespace,
						name = %target.name,
						error = %e,
						"Background provisioning failed"
					);
				}
			});
			Ok::<_, ProvisionerError>(())
		})
		.await
		.map_err(|e| ProvisionerError::Aborted {
			key,
			message: e.to_string(),
		})?
	}

	/// Current job and claim state for a target, plus its tracked run.
	pub async fn status(&self, target: &TargetRef) -> StatusReport {
		let workflow = self.tracker.get(target).await;
		self.reporter.report(target, workflow).await
	}

	/// Delete the target's claim.
	#[instrument(skip_all, fields(namespace = %target.namespace, name = %target.name))]
	pub async fn delete(&self, target: &TargetRef) -> Result<(), ProvisionerError> {
		target.validate()?;
		match self.client.delete_claim(&target.name, &target.namespace).await {
			Ok(()) => {
				info!("Deleted volume claim");
				Ok(())
			}
			Err(K8sError::ClaimNotFound { name }) => Err(ProvisionerError::NotFound { name }),
			Err(e) => Err(e.into()),
		}
	}

	/// Delete the target's copy job; its pods are garbage collected. A job
	/// that is already gone is not an error.
	#[instrument(skip_all, fields(namespace = %target.namespace, name = %target.name))]
	pub async fn cleanup(&self, target: &TargetRef) -> Result<(), ProvisionerError> {
		target.validate()?;
		let job = job_name(&target.name);
		match self.client.delete_job(&job, &target.namespace).await {
			Ok(()) => {
				info!(job = %job, "Deleted copy job");
				Ok(())
			}
			Err(K8sError::JobNotFound { .. }) => {
				info!(job = %job, "Copy job already removed");
				Ok(())
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Replace the access modes of the volume bound to the target's claim.
	#[instrument(skip_all, fields(namespace = %target.namespace, name = %target.name, mode = mode.as_str()))]
	pub async fn set_access_mode(
		&self,
		target: &TargetRef,
		mode: AccessMode,
	) -> Result<(), ProvisionerError> {
		target.validate()?;
		let claim = match self.client.get_claim(&target.name, &target.namespace).await {
			Ok(claim) => claim,
			Err(K8sError::ClaimNotFound { name }) => return Err(ProvisionerError::NotFound { name }),
			Err(e) => return Err(e.into()),
		};

		let volume = claim
			.spec
			.and_then(|s| s.volume_name)
			.filter(|v| !v.is_empty())
			.ok_or_else(|| {
				ProvisionerError::Validation(format!(
					"volume claim {} is not bound to a volume",
					target.name
				))
			})?;

		self
			.client
			.set_volume_access_modes(&volume, vec![mode.as_str().to_string()])
			.await?;
		info!(volume = %volume, "Updated volume access modes");
		Ok(())
	}

	/// Validate, register the run and check that neither claim exists yet.
	/// A registered run that fails the checks is recorded as failed.
	async fn admit(&self, req: &ProvisioningRequest, mode: RunMode) -> Result<(), ProvisionerError> {
		req.validate()?;
		self.tracker.begin(&req.target, mode).await?;

		// Best-effort only: nothing stops another creator between here and
		// the claim create, where the API server's uniqueness check decides.
		let namespace = req.target.namespace.as_str();
		let checked = match self.ensure_absent(namespace, &req.target.name).await {
			Ok(()) => {
				self
					.ensure_absent(namespace, &staging_claim_name(&req.target.name))
					.await
			}
			Err(e) => Err(e),
		};
		if checked.is_err() {
			self.tracker.finish(&req.target, &checked).await;
		}
		checked
	}

	/// Drive an admitted run to its end and record the outcome. A panic in
	/// the workflow is recorded as [`ProvisionerError::Aborted`].
	async fn execute(
		self: Arc<Self>,
		req: ProvisioningRequest,
	) -> Result<ProvisioningOutcome, ProvisionerError> {
		let target = req.target.clone();
		let worker = Arc::clone(&self);
		let result = match tokio::spawn(async move { worker.run(&req).await }).await {
			Ok(result) => result,
			Err(e) => Err(ProvisionerError::Aborted {
				key: target.key(),
				message: e.to_string(),
			}),
		};
		self.tracker.finish(&target, &result).await;
		result
	}

	#[instrument(skip(self, req), fields(namespace = %req.target.namespace, name = %req.target.name))]
	async fn run(&self, req: &ProvisioningRequest) -> Result<ProvisioningOutcome, ProvisionerError> {
		let target = &req.target;
		let namespace = target.namespace.as_str();
		let staging = staging_claim_name(&target.name);
		let job = job_name(&target.name);

		self.tracker.advance(target, WorkflowStage::Sizing).await;
		let summary = self.estimator.summarize(&req.source).await?;
		let capacity = requested_capacity(summary.total_bytes, self.config.volume_overage_percent);
		let attempts = job_completion_attempts(summary.total_bytes, self.config.avg_mbps);
		info!(
			objects = summary.object_count,
			bytes = summary.total_bytes,
			capacity,
			estimated_runtime_secs = estimated_runtime_seconds(summary.total_bytes, self.config.avg_mbps),
			job_checks = attempts,
			"Sized provisioning request"
		);

		let claim = build_staging_claim(req, &summary, capacity, &self.config);
		self.create_claim(namespace, claim).await?;
		self.tracker.advance(target, WorkflowStage::StagingCreated).await;
		info!(claim = %staging, "Created staging claim");

		// The staging claim stays in place if it never binds.
		self.wait_for_bound(namespace, &staging).await?;
		self.tracker.advance(target, WorkflowStage::StagingBound).await;

		if let Err(e) = self
			.client
			.create_job(namespace, build_copy_job(req, &self.config))
			.await
		{
			error!(job = %job, error = %e, "Could not create copy job");
			self.discard_staging(namespace, &staging).await;
			return Err(e.into());
		}
		self.tracker.advance(target, WorkflowStage::CopyJobCreated).await;
		info!(job = %job, "Created copy job");

		if let Err(e) = self.wait_for_job(namespace, &job, attempts).await {
			error!(job = %job, error = %e, "Copy job did not succeed");
			self.discard_staging(namespace, &staging).await;
			return Err(e);
		}
		self.tracker.advance(target, WorkflowStage::CopyJobSucceeded).await;
		if let Err(e) = self.client.delete_job(&job, namespace).await {
			warn!(job = %job, error = %e, "Could not delete finished copy job");
		}

		let final_claim = build_final_claim(req, &summary, capacity, &self.config);
		if let Err(e) = self.create_claim(namespace, final_claim).await {
			warn!(
				claim = %staging,
				error = %e,
				"Final claim not created; staging claim left for manual cleanup"
			);
			return Err(e);
		}
		self.tracker.advance(target, WorkflowStage::FinalClaimCreated).await;
		info!(claim = %target.name, "Created final claim");

		// Wait on the clone itself; staging was already seen bound. The
		// staging claim stays in place if the clone never binds.
		self.wait_for_bound(namespace, &target.name).await?;
		self.tracker.advance(target, WorkflowStage::FinalClaimBound).await;

		self.reclaim_staging(namespace, &staging).await;
		self.tracker.advance(target, WorkflowStage::StagingReclaimed).await;

		info!(claim = %target.name, capacity, "Provisioning complete");
		Ok(ProvisioningOutcome {
			target: target.clone(),
			summary,
			capacity_bytes: capacity,
		})
	}

	async fn ensure_absent(&self, namespace: &str, name: &str) -> Result<(), ProvisionerError> {
		match self.client.get_claim(name, namespace).await {
			Ok(_) => Err(ProvisionerError::Conflict { name: name.into() }),
			Err(K8sError::ClaimNotFound { .. }) => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	async fn create_claim(
		&self,
		namespace: &str,
		claim: pvci_server_k8s::PersistentVolumeClaim,
	) -> Result<(), ProvisionerError> {
		match self.client.create_claim(namespace, claim).await {
			Ok(_) => Ok(()),
			Err(K8sError::AlreadyExists { name }) => Err(ProvisionerError::Conflict { name }),
			Err(e) => Err(e.into()),
		}
	}

	async fn wait_for_bound(&self, namespace: &str, name: &str) -> Result<(), ProvisionerError> {
		let client = &self.client;
		let result = BackoffPoller::claim_bound()
			.poll(|| async move {
				let claim = client.get_claim(name, namespace).await?;
				let phase = claim.status.as_ref().and_then(|s| s.phase.as_deref());
				Ok::<_, K8sError>(match phase {
					Some(PHASE_BOUND) => Probe::Ready(()),
					Some(PHASE_LOST) => Probe::Failed(PHASE_LOST.to_string()),
					_ => Probe::Pending,
				})
			})
			.await?;

		match result {
			PollResult::Success(()) => {
				info!(claim = %name, "Volume claim bound");
				Ok(())
			}
			PollResult::Failure(_) => Err(ProvisionerError::ClaimLost { name: name.into() }),
			PollResult::TimedOut => Err(ProvisionerError::ClaimBoundTimeout { name: name.into() }),
		}
	}

	async fn wait_for_job(
		&self,
		namespace: &str,
		name: &str,
		attempts: u64,
	) -> Result<(), ProvisionerError> {
		let client = &self.client;
		let result = BackoffPoller::job_completion(attempts)
			.poll(|| async move {
				let job = client.get_job(name, namespace).await?;
				let status = job.status.unwrap_or_default();
				Ok::<_, K8sError>(if status.failed.unwrap_or(0) > 0 {
					Probe::Failed("job failed".to_string())
				} else if status.succeeded.unwrap_or(0) > 0 {
					Probe::Ready(())
				} else {
					Probe::Pending
				})
			})
			.await?;

		match result {
			PollResult::Success(()) => {
				info!(job = %name, "Copy job succeeded");
				Ok(())
			}
			PollResult::Failure(_) => Err(ProvisionerError::JobFailed { name: name.into() }),
			PollResult::TimedOut => Err(ProvisionerError::JobTimeout { name: name.into() }),
		}
	}

	/// Compensating delete after a failed copy. Failures are logged only.
	async fn discard_staging(&self, namespace: &str, staging: &str) {
		match self.client.delete_claim(staging, namespace).await {
			Ok(()) => info!(claim = %staging, "Deleted staging claim after failure"),
			Err(e) => error!(
				claim = %staging,
				error = %e,
				"Could not delete staging claim; it is left orphaned"
			),
		}
	}

	/// Delete the staging claim and, if it is held back by a finalizer,
	/// strip the first one so the delete completes. Failures are logged only.
	async fn reclaim_staging(&self, namespace: &str, staging: &str) {
		if let Err(e) = self.client.delete_claim(staging, namespace).await {
			warn!(claim = %staging, error = %e, "Could not delete staging claim; it is left orphaned");
			return;
		}

		let terminating = match self.client.get_claim(staging, namespace).await {
			Ok(claim) => claim
				.metadata
				.finalizers
				.as_ref()
				.is_some_and(|f| !f.is_empty()),
			Err(K8sError::ClaimNotFound { .. }) => false,
			Err(e) => {
				warn!(claim = %staging, error = %e, "Could not read staging claim after delete");
				false
			}
		};
		if !terminating {
			info!(claim = %staging, "Deleted staging claim");
			return;
		}

		match self
			.client
			.patch_claim(staging, namespace, ClaimPatch::RemoveFinalizer { index: 0 })
			.await
		{
			Ok(_) => info!(claim = %staging, "Released staging claim finalizer"),
			Err(e) => warn!(
				claim = %staging,
				error = %e,
				"Could not release staging claim finalizer; it is left terminating"
			),
		}
	}
}
