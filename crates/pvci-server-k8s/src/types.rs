// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub use k8s_openapi::api::batch::v1::{Job, JobSpec, JobStatus};
pub use k8s_openapi::api::core::v1::{
	Container, EnvVar, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
	PersistentVolumeClaimStatus, PersistentVolumeClaimVolumeSource, PersistentVolumeSpec, PodSpec,
	PodTemplateSpec, TypedLocalObjectReference, Volume, VolumeMount, VolumeResourceRequirements,
};
pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub const PHASE_PENDING: &str = "Pending";
pub const PHASE_BOUND: &str = "Bound";
pub const PHASE_LOST: &str = "Lost";

pub const ACCESS_MODE_RW_ONCE: &str = "ReadWriteOnce";
pub const ACCESS_MODE_RO_MANY: &str = "ReadOnlyMany";

/// Finalizer the controller manager places on claims that are in use.
pub const PVC_PROTECTION_FINALIZER: &str = "kubernetes.io/pvc-protection";
