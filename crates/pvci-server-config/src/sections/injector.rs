// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Volume injector configuration.

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_VOLUME_OVERAGE_PERCENT: u32 = 25;
pub const DEFAULT_AVG_MBPS: u32 = 13;
pub const DEFAULT_MC_IMAGE: &str = "minio/mc:RELEASE.2020-06-26T19-56-55Z";
pub const DEFAULT_JOB_TTL_SECS: u32 = 120;

/// Injector configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorConfig {
	/// Extra capacity requested on top of the listed object size.
	pub volume_overage_percent: u32,
	/// Assumed copy throughput, used only to size the job wait budget.
	pub avg_mbps: u32,
	/// Image running the `mc` client inside copy jobs.
	pub mc_image: String,
	/// How long finished copy jobs linger before the cluster removes them.
	pub job_ttl_secs: u32,
}

impl Default for InjectorConfig {
	fn default() -> Self {
		Self {
			volume_overage_percent: DEFAULT_VOLUME_OVERAGE_PERCENT,
			avg_mbps: DEFAULT_AVG_MBPS,
			mc_image: DEFAULT_MC_IMAGE.to_string(),
			job_ttl_secs: DEFAULT_JOB_TTL_SECS,
		}
	}
}

/// Injector configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InjectorConfigLayer {
	#[serde(default)]
	pub volume_overage_percent: Option<u32>,
	#[serde(default)]
	pub avg_mbps: Option<u32>,
	#[serde(default)]
	pub mc_image: Option<String>,
	#[serde(default)]
	pub job_ttl_secs: Option<u32>,
}

impl InjectorConfigLayer {
	pub fn merge(&mut self, other: InjectorConfigLayer) {
		if other.volume_overage_percent.is_some() {
			self.volume_overage_percent = other.volume_overage_percent;
		}
		if other.avg_mbps.is_some() {
			self.avg_mbps = other.avg_mbps;
		}
		if other.mc_image.is_some() {
			self.mc_image = other.mc_image;
		}
		if other.job_ttl_secs.is_some() {
			self.job_ttl_secs = other.job_ttl_secs;
		}
	}

	pub fn finalize(self) -> Result<InjectorConfig, ConfigError> {
		let config = InjectorConfig {
			volume_overage_percent: self
				.volume_overage_percent
				.unwrap_or(DEFAULT_VOLUME_OVERAGE_PERCENT),
			avg_mbps: self.avg_mbps.unwrap_or(DEFAULT_AVG_MBPS),
			mc_image: self
				.mc_image
				.unwrap_or_else(|| DEFAULT_MC_IMAGE.to_string()),
			job_ttl_secs: self.job_ttl_secs.unwrap_or(DEFAULT_JOB_TTL_SECS),
		};

		if config.avg_mbps == 0 {
			return Err(ConfigError::Validation(
				"injector.avg_mbps must be greater than zero".to_string(),
			));
		}
		if config.mc_image.trim().is_empty() {
			return Err(ConfigError::Validation(
				"injector.mc_image must not be empty".to_string(),
			));
		}

		Ok(config)
	}
}
