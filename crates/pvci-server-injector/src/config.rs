// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioner configuration.

/// Configuration for the volume provisioner.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
	/// Value of the service label on created resources
	pub service: String,
	/// Value of the version label on created resources
	pub version: String,
	/// Percentage added to the listed size when requesting capacity
	pub volume_overage_percent: u32,
	/// Assumed copy throughput in MB/s, drives the job wait budget
	pub avg_mbps: u32,
	/// Image providing the `mc` client for copy jobs
	pub mc_image: String,
	/// Seconds a finished copy job is kept before the cluster removes it
	pub job_ttl_secs: u32,
}

impl Default for ProvisionerConfig {
	fn default() -> Self {
		Self {
			service: "pvci".to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
			volume_overage_percent: 25,
			avg_mbps: 13,
			mc_image: "minio/mc:RELEASE.2020-06-26T19-56-55Z".to_string(),
			job_ttl_secs: 120,
		}
	}
}
