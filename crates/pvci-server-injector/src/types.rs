// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for volume provisioning.

use std::fmt;

use pvci_object_store::{S3Source, SizeSummary};
use pvci_server_k8s::{ACCESS_MODE_RO_MANY, ACCESS_MODE_RW_ONCE};
use serde::Serialize;

use crate::error::ProvisionerError;
use crate::manifests::JOB_SUFFIX;

/// K8s object names are DNS-1123 labels; the job name adds a suffix.
const MAX_NAME_LENGTH: usize = 63 - JOB_SUFFIX.len();

/// A namespaced target name. Staging claim and job names derive from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetRef {
	pub namespace: String,
	pub name: String,
}

impl TargetRef {
	pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			name: name.into(),
		}
	}

	/// Key used by the workflow tracker.
	pub fn key(&self) -> String {
		format!("{}/{}", self.namespace, self.name)
	}

	/// Reject names the cluster would refuse, before anything is created.
	pub fn validate(&self) -> Result<(), ProvisionerError> {
		validate_dns_label("namespace", &self.namespace, 63)?;
		validate_dns_label("name", &self.name, MAX_NAME_LENGTH)
	}
}

impl fmt::Display for TargetRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.namespace, self.name)
	}
}

fn validate_dns_label(field: &str, value: &str, max: usize) -> Result<(), ProvisionerError> {
	if value.is_empty() {
		return Err(ProvisionerError::Validation(format!("{field} is required")));
	}
	if value.len() > max {
		return Err(ProvisionerError::Validation(format!(
			"{field} must be at most {max} characters"
		)));
	}
	let valid_chars = value
		.chars()
		.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
	let valid_ends = value.starts_with(|c: char| c.is_ascii_alphanumeric())
		&& value.ends_with(|c: char| c.is_ascii_alphanumeric());
	if !valid_chars || !valid_ends {
		return Err(ProvisionerError::Validation(format!(
			"{field} '{value}' must consist of lower case alphanumeric characters or '-' and start and end with an alphanumeric character"
		)));
	}
	Ok(())
}

/// A request to provision a claim populated from an object-store prefix.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
	pub source: S3Source,
	pub target: TargetRef,
	/// `None` uses the cluster's default storage class.
	pub storage_class: Option<String>,
}

impl ProvisioningRequest {
	pub fn validate(&self) -> Result<(), ProvisionerError> {
		self.target.validate()?;
		validate_source(&self.source)
	}
}

/// An object-store source needs at least an endpoint and a bucket.
pub fn validate_source(source: &S3Source) -> Result<(), ProvisionerError> {
	if source.endpoint.trim().is_empty() {
		return Err(ProvisionerError::Validation("s3_endpoint is required".into()));
	}
	if source.bucket.trim().is_empty() {
		return Err(ProvisionerError::Validation("s3_bucket is required".into()));
	}
	Ok(())
}

/// Result of a completed provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningOutcome {
	pub target: TargetRef,
	pub summary: SizeSummary,
	pub capacity_bytes: u64,
}

/// Access modes that can be forced onto a bound volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
	ReadOnlyMany,
	ReadWriteOnce,
}

impl AccessMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			AccessMode::ReadOnlyMany => ACCESS_MODE_RO_MANY,
			AccessMode::ReadWriteOnce => ACCESS_MODE_RW_ONCE,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_joins_namespace_and_name() {
		let target = TargetRef::new("data", "mnist");
		assert_eq!(target.key(), "data/mnist");
		assert_eq!(target.to_string(), "data/mnist");
	}

	#[test]
	fn validate_accepts_dns_labels() {
		assert!(TargetRef::new("default", "train-2020").validate().is_ok());
	}

	#[test]
	fn validate_rejects_bad_names() {
		let too_long = "a".repeat(MAX_NAME_LENGTH + 1);
		for name in ["", "Upper", "under_score", "-lead", "trail-", too_long.as_str()] {
			let result = TargetRef::new("default", name).validate();
			assert!(
				matches!(result, Err(ProvisionerError::Validation(_))),
				"{name:?} should be rejected"
			);
		}
	}

	#[test]
	fn longest_name_leaves_room_for_job_suffix() {
		let name = "a".repeat(MAX_NAME_LENGTH);
		assert!(TargetRef::new("default", &name).validate().is_ok());
		assert_eq!(format!("{name}{JOB_SUFFIX}").len(), 63);
	}
}
