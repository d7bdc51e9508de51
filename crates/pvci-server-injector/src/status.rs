// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only status of a target's copy job and claim.

use std::sync::Arc;

use pvci_server_k8s::{
	Job, K8sClient, K8sError, PersistentVolumeClaim, PersistentVolumeClaimStatus, PHASE_BOUND,
};
use serde::Serialize;
use tracing::instrument;

use crate::manifests::{job_name, staging_claim_name, target_selector};
use crate::tracker::WorkflowRecord;
use crate::types::TargetRef;

pub const NO_INJECTORS: &str = "no injectors found";

pub const JOB_PHASE_PENDING: &str = "Pending";
pub const JOB_PHASE_ACTIVE: &str = "Active";
pub const JOB_PHASE_SUCCEEDED: &str = "Succeeded";
pub const JOB_PHASE_FAILED: &str = "Failed";
/// No job left and the final claim is bound: the job finished and was removed.
pub const JOB_PHASE_RECLAIMED: &str = "Reclaimed";
pub const JOB_PHASE_UNKNOWN: &str = "Unknown";

/// Pod counters of a copy job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
	pub name: String,
	pub active: i32,
	pub succeeded: i32,
	pub failed: i32,
}

impl JobSnapshot {
	fn from_job(job: &Job) -> Self {
		let status = job.status.clone().unwrap_or_default();
		Self {
			name: job.metadata.name.clone().unwrap_or_default(),
			active: status.active.unwrap_or(0),
			succeeded: status.succeeded.unwrap_or(0),
			failed: status.failed.unwrap_or(0),
		}
	}

	pub fn phase(&self) -> &'static str {
		if self.failed > 0 {
			JOB_PHASE_FAILED
		} else if self.succeeded > 0 {
			JOB_PHASE_SUCCEEDED
		} else if self.active > 0 {
			JOB_PHASE_ACTIVE
		} else {
			JOB_PHASE_PENDING
		}
	}
}

/// Composite status of a target. Missing resources are reported in the
/// error fields, never as a failed query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
	pub job_has_error: bool,
	pub job_error: String,
	pub job_phase: String,
	pub job_status: Option<JobSnapshot>,
	pub pvc_has_error: bool,
	pub pvc_error: String,
	/// The final claim, or the staging claim while the copy is in progress.
	pub pvc_name: Option<String>,
	pub pvc_status: Option<PersistentVolumeClaimStatus>,
	pub workflow: Option<WorkflowRecord>,
}

impl StatusReport {
	pub fn pvc_phase(&self) -> Option<&str> {
		self.pvc_status.as_ref().and_then(|s| s.phase.as_deref())
	}
}

#[derive(Clone)]
pub struct StatusReporter {
	client: Arc<dyn K8sClient>,
}

impl StatusReporter {
	pub fn new(client: Arc<dyn K8sClient>) -> Self {
		Self { client }
	}

	#[instrument(skip(self, workflow), fields(namespace = %target.namespace, name = %target.name))]
	pub async fn report(&self, target: &TargetRef, workflow: Option<WorkflowRecord>) -> StatusReport {
		let mut report = StatusReport {
			job_has_error: false,
			job_error: String::new(),
			job_phase: JOB_PHASE_UNKNOWN.to_string(),
			job_status: None,
			pvc_has_error: false,
			pvc_error: String::new(),
			pvc_name: None,
			pvc_status: None,
			workflow,
		};

		let final_bound = match self.find_claim(target).await {
			Ok((name, claim)) => {
				let bound = name == target.name
					&& claim.status.as_ref().and_then(|s| s.phase.as_deref()) == Some(PHASE_BOUND);
				report.pvc_name = Some(name);
				report.pvc_status = claim.status;
				bound
			}
			Err(e) => {
				report.pvc_has_error = true;
				report.pvc_error = e.to_string();
				false
			}
		};

		match self
			.client
			.list_jobs(&target.namespace, &target_selector(&target.name))
			.await
		{
			Ok(jobs) => {
				let expected = job_name(&target.name);
				let job = jobs
					.iter()
					.find(|j| j.metadata.name.as_deref() == Some(expected.as_str()))
					.or_else(|| jobs.first());
				match job {
					Some(job) => {
						let snapshot = JobSnapshot::from_job(job);
						report.job_phase = snapshot.phase().to_string();
						report.job_status = Some(snapshot);
					}
					None if final_bound => {
						report.job_phase = JOB_PHASE_RECLAIMED.to_string();
					}
					None => {
						report.job_has_error = true;
						report.job_error = NO_INJECTORS.to_string();
					}
				}
			}
			Err(e) => {
				report.job_has_error = true;
				report.job_error = e.to_string();
			}
		}

		report
	}

	/// The final claim if it exists, otherwise the staging claim.
	async fn find_claim(&self, target: &TargetRef) -> Result<(String, PersistentVolumeClaim), K8sError> {
		match self.client.get_claim(&target.name, &target.namespace).await {
			Ok(claim) => Ok((target.name.clone(), claim)),
			Err(e) if e.is_not_found() => {
				let staging = staging_claim_name(&target.name);
				match self.client.get_claim(&staging, &target.namespace).await {
					Ok(claim) => Ok((staging, claim)),
					Err(staging_err) if staging_err.is_not_found() => Err(e),
					Err(staging_err) => Err(staging_err),
				}
			}
			Err(e) => Err(e),
		}
	}
}
