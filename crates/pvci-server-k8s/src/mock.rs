// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory cluster used by tests across the workspace.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use crate::client::{ClaimPatch, Jobs, PersistentVolumes, VolumeClaims};
use crate::error::K8sError;
use crate::types::{
	Job, JobStatus, ObjectMeta, PersistentVolume, PersistentVolumeClaim,
	PersistentVolumeClaimStatus, PersistentVolumeSpec, PHASE_BOUND, PHASE_LOST, PHASE_PENDING,
	PVC_PROTECTION_FINALIZER,
};

/// How created claims progress as they are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimBehavior {
	/// Bound once the claim has been read this many times.
	BindAfter(u32),
	/// Stays `Pending` forever.
	NeverBind,
	/// Moves to `Lost` once the claim has been read this many times.
	LoseAfter(u32),
}

impl Default for ClaimBehavior {
	fn default() -> Self {
		ClaimBehavior::BindAfter(1)
	}
}

/// How created jobs progress as they are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobBehavior {
	SucceedAfter(u32),
	FailAfter(u32),
	NeverFinish,
}

impl Default for JobBehavior {
	fn default() -> Self {
		JobBehavior::SucceedAfter(1)
	}
}

/// A recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
	CreateClaim { namespace: String, name: String },
	GetClaim { namespace: String, name: String },
	DeleteClaim { namespace: String, name: String },
	PatchClaim { namespace: String, name: String, patch: ClaimPatch },
	CreateJob { namespace: String, name: String },
	GetJob { namespace: String, name: String },
	ListJobs { namespace: String, selector: String },
	DeleteJob { namespace: String, name: String },
	GetVolume { name: String },
	SetVolumeAccessModes { name: String, access_modes: Vec<String> },
}

struct StoredClaim {
	claim: PersistentVolumeClaim,
	reads: u32,
	progresses: bool,
}

struct StoredJob {
	job: Job,
	reads: u32,
	progresses: bool,
}

#[derive(Default)]
struct MockState {
	claims: BTreeMap<(String, String), StoredClaim>,
	jobs: BTreeMap<(String, String), StoredJob>,
	volumes: BTreeMap<String, PersistentVolume>,
	calls: Vec<MockCall>,
	claim_behavior: ClaimBehavior,
	claim_behavior_by_name: HashMap<String, ClaimBehavior>,
	job_behavior: JobBehavior,
	protect_claims: bool,
	reject_claims: HashSet<String>,
	reject_jobs: bool,
	fail_claim_deletes: bool,
	fail_job_deletes: bool,
}

/// Mock cluster for testing.
///
/// Claims and jobs created through the traits progress according to the
/// configured [`ClaimBehavior`] and [`JobBehavior`] each time they are read.
/// Objects seeded with `insert_*` are returned as-is.
#[derive(Clone, Default)]
pub struct MockK8sClient {
	state: Arc<Mutex<MockState>>,
}

fn key(namespace: &str, name: &str) -> (String, String) {
	(namespace.to_string(), name.to_string())
}

fn set_claim_phase(claim: &mut PersistentVolumeClaim, phase: &str) {
	let status = claim
		.status
		.get_or_insert_with(PersistentVolumeClaimStatus::default);
	status.phase = Some(phase.to_string());
}

fn claim_phase(claim: &PersistentVolumeClaim) -> Option<&str> {
	claim.status.as_ref().and_then(|s| s.phase.as_deref())
}

fn selector_matches(selector: &str, job: &Job) -> bool {
	let labels = job.metadata.labels.clone().unwrap_or_default();
	selector
		.split(',')
		.filter(|term| !term.is_empty())
		.all(|term| match term.split_once('=') {
			Some((k, v)) => labels.get(k.trim()).map(String::as_str) == Some(v.trim()),
			None => labels.contains_key(term.trim()),
		})
}

impl MockK8sClient {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_claim_behavior(self, behavior: ClaimBehavior) -> Self {
		self.state.lock().unwrap().claim_behavior = behavior;
		self
	}

	/// Override the claim behaviour for claims with this name only.
	pub fn with_claim_behavior_for(self, name: &str, behavior: ClaimBehavior) -> Self {
		self
			.state
			.lock()
			.unwrap()
			.claim_behavior_by_name
			.insert(name.to_string(), behavior);
		self
	}

	pub fn with_job_behavior(self, behavior: JobBehavior) -> Self {
		self.state.lock().unwrap().job_behavior = behavior;
		self
	}

	/// Created claims carry the pvc-protection finalizer, so deleting them
	/// leaves them terminating until the finalizer is removed.
	pub fn with_claim_protection(self) -> Self {
		self.state.lock().unwrap().protect_claims = true;
		self
	}

	/// Reject creation of the named claim.
	pub fn reject_claim(self, name: &str) -> Self {
		self.state.lock().unwrap().reject_claims.insert(name.to_string());
		self
	}

	/// Reject creation of every job.
	pub fn reject_jobs(self) -> Self {
		self.state.lock().unwrap().reject_jobs = true;
		self
	}

	pub fn fail_claim_deletes(self) -> Self {
		self.state.lock().unwrap().fail_claim_deletes = true;
		self
	}

	pub fn fail_job_deletes(self) -> Self {
		self.state.lock().unwrap().fail_job_deletes = true;
		self
	}

	/// Seed a claim that does not progress.
	pub fn insert_claim(&self, namespace: &str, mut claim: PersistentVolumeClaim) {
		let name = claim.metadata.name.clone().unwrap_or_default();
		claim.metadata.namespace = Some(namespace.to_string());
		self.state.lock().unwrap().claims.insert(
			key(namespace, &name),
			StoredClaim {
				claim,
				reads: 0,
				progresses: false,
			},
		);
	}

	/// Seed a job that does not progress.
	pub fn insert_job(&self, namespace: &str, mut job: Job) {
		let name = job.metadata.name.clone().unwrap_or_default();
		job.metadata.namespace = Some(namespace.to_string());
		self.state.lock().unwrap().jobs.insert(
			key(namespace, &name),
			StoredJob {
				job,
				reads: 0,
				progresses: false,
			},
		);
	}

	pub fn insert_volume(&self, volume: PersistentVolume) {
		let name = volume.metadata.name.clone().unwrap_or_default();
		self.state.lock().unwrap().volumes.insert(name, volume);
	}

	pub fn claim(&self, namespace: &str, name: &str) -> Option<PersistentVolumeClaim> {
		let state = self.state.lock().unwrap();
		state.claims.get(&key(namespace, name)).map(|c| c.claim.clone())
	}

	pub fn job(&self, namespace: &str, name: &str) -> Option<Job> {
		let state = self.state.lock().unwrap();
		state.jobs.get(&key(namespace, name)).map(|j| j.job.clone())
	}

	pub fn volume(&self, name: &str) -> Option<PersistentVolume> {
		self.state.lock().unwrap().volumes.get(name).cloned()
	}

	/// All calls made so far, in order.
	pub fn calls(&self) -> Vec<MockCall> {
		self.state.lock().unwrap().calls.clone()
	}

	/// Names of every claim a caller attempted to create.
	pub fn created_claims(&self) -> Vec<String> {
		self
			.calls()
			.into_iter()
			.filter_map(|call| match call {
				MockCall::CreateClaim { name, .. } => Some(name),
				_ => None,
			})
			.collect()
	}

	pub fn created_jobs(&self) -> Vec<String> {
		self
			.calls()
			.into_iter()
			.filter_map(|call| match call {
				MockCall::CreateJob { name, .. } => Some(name),
				_ => None,
			})
			.collect()
	}

	fn record(state: &mut MockState, call: MockCall) {
		state.calls.push(call);
	}
}

impl MockState {
	fn advance_claim(&mut self, namespace: &str, name: &str) {
		let behavior = self
			.claim_behavior_by_name
			.get(name)
			.copied()
			.unwrap_or(self.claim_behavior);
		let Some(stored) = self.claims.get_mut(&key(namespace, name)) else {
			return;
		};
		if !stored.progresses {
			return;
		}
		stored.reads += 1;
		if claim_phase(&stored.claim) != Some(PHASE_PENDING) {
			return;
		}

		match behavior {
			ClaimBehavior::BindAfter(n) if stored.reads >= n => {
				let volume_name = format!("pvc-{namespace}-{name}");
				set_claim_phase(&mut stored.claim, PHASE_BOUND);
				let access_modes = stored
					.claim
					.spec
					.as_ref()
					.and_then(|s| s.access_modes.clone());
				if let Some(spec) = stored.claim.spec.as_mut() {
					spec.volume_name = Some(volume_name.clone());
				}
				self.volumes.insert(
					volume_name.clone(),
					PersistentVolume {
						metadata: ObjectMeta {
							name: Some(volume_name),
							..Default::default()
						},
						spec: Some(PersistentVolumeSpec {
							access_modes,
							..Default::default()
						}),
						status: None,
					},
				);
			}
			ClaimBehavior::LoseAfter(n) if stored.reads >= n => {
				set_claim_phase(&mut stored.claim, PHASE_LOST);
			}
			_ => {}
		}
	}

	fn advance_job(&mut self, namespace: &str, name: &str) {
		let behavior = self.job_behavior;
		let Some(stored) = self.jobs.get_mut(&key(namespace, name)) else {
			return;
		};
		if !stored.progresses {
			return;
		}
		stored.reads += 1;
		let status = stored.job.status.get_or_insert_with(JobStatus::default);
		if status.succeeded.unwrap_or(0) > 0 || status.failed.unwrap_or(0) > 0 {
			return;
		}

		match behavior {
			JobBehavior::SucceedAfter(n) if stored.reads >= n => {
				status.active = Some(0);
				status.succeeded = Some(1);
			}
			JobBehavior::FailAfter(n) if stored.reads >= n => {
				status.active = Some(0);
				status.failed = Some(1);
			}
			_ => {
				status.active = Some(1);
			}
		}
	}
}

#[async_trait]
impl VolumeClaims for MockK8sClient {
	async fn create_claim(
		&self,
		namespace: &str,
		mut claim: PersistentVolumeClaim,
	) -> Result<PersistentVolumeClaim, K8sError> {
		let name = claim.metadata.name.clone().unwrap_or_default();
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::CreateClaim {
				namespace: namespace.into(),
				name: name.clone(),
			},
		);

		if state.reject_claims.contains(&name) {
			return Err(K8sError::Rejected {
				name,
				message: "rejected by mock".into(),
			});
		}
		if state.claims.contains_key(&key(namespace, &name)) {
			return Err(K8sError::AlreadyExists { name });
		}

		claim.metadata.namespace = Some(namespace.to_string());
		if state.protect_claims {
			claim
				.metadata
				.finalizers
				.get_or_insert_with(Vec::new)
				.push(PVC_PROTECTION_FINALIZER.to_string());
		}
		set_claim_phase(&mut claim, PHASE_PENDING);
		state.claims.insert(
			key(namespace, &name),
			StoredClaim {
				claim: claim.clone(),
				reads: 0,
				progresses: true,
			},
		);
		Ok(claim)
	}

	async fn get_claim(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<PersistentVolumeClaim, K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::GetClaim {
				namespace: namespace.into(),
				name: name.into(),
			},
		);
		state.advance_claim(namespace, name);
		state
			.claims
			.get(&key(namespace, name))
			.map(|c| c.claim.clone())
			.ok_or_else(|| K8sError::ClaimNotFound { name: name.into() })
	}

	async fn delete_claim(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::DeleteClaim {
				namespace: namespace.into(),
				name: name.into(),
			},
		);
		if state.fail_claim_deletes {
			return Err(K8sError::ApiError {
				message: "delete failed in mock".into(),
			});
		}

		let k = key(namespace, name);
		let Some(stored) = state.claims.get_mut(&k) else {
			return Err(K8sError::ClaimNotFound { name: name.into() });
		};
		let has_finalizers = stored
			.claim
			.metadata
			.finalizers
			.as_ref()
			.is_some_and(|f| !f.is_empty());
		if has_finalizers {
			stored.claim.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
		} else {
			state.claims.remove(&k);
		}
		Ok(())
	}

	async fn patch_claim(
		&self,
		name: &str,
		namespace: &str,
		patch: ClaimPatch,
	) -> Result<PersistentVolumeClaim, K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::PatchClaim {
				namespace: namespace.into(),
				name: name.into(),
				patch: patch.clone(),
			},
		);

		let k = key(namespace, name);
		let Some(stored) = state.claims.get_mut(&k) else {
			return Err(K8sError::ClaimNotFound { name: name.into() });
		};
		match patch {
			ClaimPatch::RemoveFinalizer { index } => {
				if let Some(finalizers) = stored.claim.metadata.finalizers.as_mut() {
					if index < finalizers.len() {
						finalizers.remove(index);
					}
				}
			}
		}

		let claim = stored.claim.clone();
		let released = claim.metadata.deletion_timestamp.is_some()
			&& claim.metadata.finalizers.as_ref().map_or(true, |f| f.is_empty());
		if released {
			state.claims.remove(&k);
		}
		Ok(claim)
	}
}

#[async_trait]
impl Jobs for MockK8sClient {
	async fn create_job(&self, namespace: &str, mut job: Job) -> Result<Job, K8sError> {
		let name = job.metadata.name.clone().unwrap_or_default();
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::CreateJob {
				namespace: namespace.into(),
				name: name.clone(),
			},
		);

		if state.reject_jobs {
			return Err(K8sError::Rejected {
				name,
				message: "rejected by mock".into(),
			});
		}
		if state.jobs.contains_key(&key(namespace, &name)) {
			return Err(K8sError::AlreadyExists { name });
		}

		job.metadata.namespace = Some(namespace.to_string());
		job.status = Some(JobStatus {
			active: Some(1),
			..Default::default()
		});
		state.jobs.insert(
			key(namespace, &name),
			StoredJob {
				job: job.clone(),
				reads: 0,
				progresses: true,
			},
		);
		Ok(job)
	}

	async fn get_job(&self, name: &str, namespace: &str) -> Result<Job, K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::GetJob {
				namespace: namespace.into(),
				name: name.into(),
			},
		);
		state.advance_job(namespace, name);
		state
			.jobs
			.get(&key(namespace, name))
			.map(|j| j.job.clone())
			.ok_or_else(|| K8sError::JobNotFound { name: name.into() })
	}

	async fn list_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<Job>, K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::ListJobs {
				namespace: namespace.into(),
				selector: label_selector.into(),
			},
		);
		Ok(state
			.jobs
			.iter()
			.filter(|((ns, _), stored)| ns == namespace && selector_matches(label_selector, &stored.job))
			.map(|(_, stored)| stored.job.clone())
			.collect())
	}

	async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::DeleteJob {
				namespace: namespace.into(),
				name: name.into(),
			},
		);
		if state.fail_job_deletes {
			return Err(K8sError::ApiError {
				message: "delete failed in mock".into(),
			});
		}
		match state.jobs.remove(&key(namespace, name)) {
			Some(_) => Ok(()),
			None => Err(K8sError::JobNotFound { name: name.into() }),
		}
	}
}

#[async_trait]
impl PersistentVolumes for MockK8sClient {
	async fn get_volume(&self, name: &str) -> Result<PersistentVolume, K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(&mut state, MockCall::GetVolume { name: name.into() });
		state
			.volumes
			.get(name)
			.cloned()
			.ok_or_else(|| K8sError::VolumeNotFound { name: name.into() })
	}

	async fn set_volume_access_modes(
		&self,
		name: &str,
		access_modes: Vec<String>,
	) -> Result<PersistentVolume, K8sError> {
		let mut state = self.state.lock().unwrap();
		Self::record(
			&mut state,
			MockCall::SetVolumeAccessModes {
				name: name.into(),
				access_modes: access_modes.clone(),
			},
		);
		let Some(volume) = state.volumes.get_mut(name) else {
			return Err(K8sError::VolumeNotFound { name: name.into() });
		};
		volume
			.spec
			.get_or_insert_with(PersistentVolumeSpec::default)
			.access_modes = Some(access_modes);
		Ok(volume.clone())
	}
}
