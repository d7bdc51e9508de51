// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for PVCI volume provisioning.
//!
//! This crate provides:
//! - Typed capability traits for volume claims, copy jobs and persistent volumes
//! - Production implementation using the kube crate
//! - An in-memory mock cluster for tests

mod client;
mod error;
mod kube_client;
mod mock;
mod types;

pub use client::{ClaimPatch, Jobs, K8sClient, PersistentVolumes, VolumeClaims};
pub use error::{K8sError, K8sResult};
pub use kube_client::KubeClient;
pub use mock::{ClaimBehavior, JobBehavior, MockCall, MockK8sClient};
pub use types::{
	Container, EnvVar, Job, JobSpec, JobStatus, ObjectMeta, PersistentVolume,
	PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimStatus,
	PersistentVolumeClaimVolumeSource, PersistentVolumeSpec, PodSpec, PodTemplateSpec, Quantity,
	TypedLocalObjectReference, Volume, VolumeMount, VolumeResourceRequirements, ACCESS_MODE_RO_MANY,
	ACCESS_MODE_RW_ONCE, PHASE_BOUND, PHASE_LOST, PHASE_PENDING, PVC_PROTECTION_FINALIZER,
};
