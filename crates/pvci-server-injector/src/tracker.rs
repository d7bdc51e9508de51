// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process record of provisioning runs, keyed by `namespace/name`.
//!
//! Every run registers here before touching the cluster and records each
//! stage it reaches. Detached runs have no other channel back to the caller,
//! so status queries read their outcome from here. Records live only as long
//! as the process; finished ones are dropped once older than the retention
//! window.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::ProvisionerError;
use crate::types::TargetRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
	Validating,
	Sizing,
	StagingCreated,
	StagingBound,
	CopyJobCreated,
	CopyJobSucceeded,
	FinalClaimCreated,
	FinalClaimBound,
	StagingReclaimed,
	Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
	Sync,
	Async,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowOutcome {
	Running,
	Succeeded,
	/// `stage` is the last stage reached before the failure.
	Failed { stage: WorkflowStage, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRecord {
	pub mode: RunMode,
	pub stage: WorkflowStage,
	pub outcome: WorkflowOutcome,
	pub started_at: DateTime<Utc>,
	pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowRecord {
	pub fn is_running(&self) -> bool {
		self.outcome == WorkflowOutcome::Running
	}
}

/// How long a finished record stays queryable.
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct WorkflowTracker {
	records: Arc<RwLock<HashMap<String, WorkflowRecord>>>,
	retention: Duration,
}

impl Default for WorkflowTracker {
	fn default() -> Self {
		Self::with_retention(Duration::hours(DEFAULT_RETENTION_HOURS))
	}
}

impl WorkflowTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_retention(retention: Duration) -> Self {
		Self {
			records: Arc::new(RwLock::new(HashMap::new())),
			retention,
		}
	}

	/// Register a new run. Refused while an earlier run for the same target
	/// is still running; a finished record is replaced. Finished records past
	/// the retention window are evicted first.
	pub async fn begin(&self, target: &TargetRef, mode: RunMode) -> Result<(), ProvisionerError> {
		let key = target.key();
		let mut records = self.records.write().await;
		let now = Utc::now();
		records.retain(|_, record| {
			record
				.finished_at
				.map_or(true, |finished| now - finished < self.retention)
		});
		if records.get(&key).is_some_and(WorkflowRecord::is_running) {
			return Err(ProvisionerError::InProgress { key });
		}
		records.insert(
			key,
			WorkflowRecord {
				mode,
				stage: WorkflowStage::Validating,
				outcome: WorkflowOutcome::Running,
				started_at: now,
				finished_at: None,
			},
		);
		Ok(())
	}

	pub async fn advance(&self, target: &TargetRef, stage: WorkflowStage) {
		if let Some(record) = self.records.write().await.get_mut(&target.key()) {
			record.stage = stage;
		}
		tracing::debug!(workflow = %target, ?stage, "Workflow advanced");
	}

	/// Record the terminal outcome of a run.
	pub async fn finish<T>(&self, target: &TargetRef, result: &Result<T, ProvisionerError>) {
		if let Some(record) = self.records.write().await.get_mut(&target.key()) {
			record.finished_at = Some(Utc::now());
			record.outcome = match result {
				Ok(_) => {
					record.stage = WorkflowStage::Done;
					WorkflowOutcome::Succeeded
				}
				Err(e) => WorkflowOutcome::Failed {
					stage: record.stage,
					message: e.to_string(),
				},
			};
		}
	}

	pub async fn get(&self, target: &TargetRef) -> Option<WorkflowRecord> {
		self.records.read().await.get(&target.key()).cloned()
	}

	pub async fn record_count(&self) -> usize {
		self.records.read().await.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn target() -> TargetRef {
		TargetRef::new("ml", "mnist")
	}

	#[tokio::test]
	async fn in_flight_run_blocks_second_begin() {
		let tracker = WorkflowTracker::new();
		tracker.begin(&target(), RunMode::Async).await.unwrap();

		let err = tracker.begin(&target(), RunMode::Async).await.unwrap_err();
		assert!(matches!(err, ProvisionerError::InProgress { ref key } if key == "ml/mnist"));
	}

	#[tokio::test]
	async fn finished_run_can_be_replaced() {
		let tracker = WorkflowTracker::new();
		tracker.begin(&target(), RunMode::Sync).await.unwrap();
		tracker.finish(&target(), &Ok::<(), ProvisionerError>(())).await;

		tracker.begin(&target(), RunMode::Async).await.unwrap();
		let record = tracker.get(&target()).await.unwrap();
		assert_eq!(record.mode, RunMode::Async);
		assert!(record.is_running());
	}

	#[tokio::test]
	async fn failure_records_last_stage() {
		let tracker = WorkflowTracker::new();
		tracker.begin(&target(), RunMode::Async).await.unwrap();
		tracker.advance(&target(), WorkflowStage::CopyJobCreated).await;
		tracker
			.finish(
				&target(),
				&Err::<(), _>(ProvisionerError::JobFailed {
					name: "mnist-injector".into(),
				}),
			)
			.await;

		let record = tracker.get(&target()).await.unwrap();
		assert_eq!(
			record.outcome,
			WorkflowOutcome::Failed {
				stage: WorkflowStage::CopyJobCreated,
				message: "job failed".into()
			}
		);
		assert!(record.finished_at.is_some());
	}

	#[tokio::test]
	async fn success_marks_done() {
		let tracker = WorkflowTracker::new();
		tracker.begin(&target(), RunMode::Sync).await.unwrap();
		tracker.finish(&target(), &Ok::<(), ProvisionerError>(())).await;

		let record = tracker.get(&target()).await.unwrap();
		assert_eq!(record.stage, WorkflowStage::Done);
		assert_eq!(record.outcome, WorkflowOutcome::Succeeded);
	}

	#[tokio::test]
	async fn expired_records_are_evicted_on_begin() {
		let tracker = WorkflowTracker::with_retention(Duration::zero());
		let done = TargetRef::new("ml", "old");
		tracker.begin(&done, RunMode::Sync).await.unwrap();
		tracker.finish(&done, &Ok::<(), ProvisionerError>(())).await;
		let running = TargetRef::new("ml", "busy");
		tracker.begin(&running, RunMode::Async).await.unwrap();

		tracker.begin(&target(), RunMode::Sync).await.unwrap();

		assert!(tracker.get(&done).await.is_none());
		assert!(tracker.get(&running).await.is_some());
		assert_eq!(tracker.record_count().await, 2);
	}

	#[tokio::test]
	async fn recent_records_are_kept() {
		let tracker = WorkflowTracker::new();
		let done = TargetRef::new("ml", "old");
		tracker.begin(&done, RunMode::Sync).await.unwrap();
		tracker.finish(&done, &Ok::<(), ProvisionerError>(())).await;

		tracker.begin(&target(), RunMode::Sync).await.unwrap();
		assert!(tracker.get(&done).await.is_some());
	}

	#[test]
	fn outcome_serializes_with_state_tag() {
		let json = serde_json::to_value(WorkflowOutcome::Failed {
			stage: WorkflowStage::StagingBound,
			message: "x".into(),
		})
		.unwrap();
		assert_eq!(json["state"], "failed");
		assert_eq!(json["stage"], "staging_bound");
	}
}
