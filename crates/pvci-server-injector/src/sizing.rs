// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Size estimation: object-store totals, requested capacity and the copy
//! job's wait budget.

use std::sync::Arc;

use pvci_object_store::{summarize, ObjectStore, S3Source, SizeSummary};
use tracing::instrument;

use crate::error::ProvisionerError;

const BYTES_PER_MIB: u128 = 1_048_576;
/// Bytes to MiB-denominated capacity factor, 1.048576 as a ratio.
const MIB_FACTOR_NUM: u128 = 1_048_576;
const MIB_FACTOR_DEN: u128 = 1_000_000;
/// Interval between copy job checks.
pub const JOB_POLL_INTERVAL_SECS: u64 = 5;
/// Minimum number of copy job checks regardless of payload size.
pub const MIN_JOB_ATTEMPTS: u64 = 6;

/// `ceil(total_bytes * 1.048576 * (1 + overage_percent / 100))`, computed
/// exactly in integers.
pub fn requested_capacity(total_bytes: u64, overage_percent: u32) -> u64 {
	let numerator = total_bytes as u128 * MIB_FACTOR_NUM * (100 + overage_percent as u128);
	let denominator = MIB_FACTOR_DEN * 100;
	let capacity = numerator.div_ceil(denominator);
	u64::try_from(capacity).unwrap_or(u64::MAX)
}

/// `total_bytes / (avg_mbps * 1048576)`.
pub fn estimated_runtime_seconds(total_bytes: u64, avg_mbps: u32) -> f64 {
	total_bytes as f64 / (avg_mbps.max(1) as f64 * BYTES_PER_MIB as f64)
}

/// `max(6, ceil(estimated_runtime_seconds * 1.5 / 5))`, computed exactly in
/// integers.
pub fn job_completion_attempts(total_bytes: u64, avg_mbps: u32) -> u64 {
	// runtime * 1.5 / 5 == bytes * 3 / (rate * 10)
	let numerator = total_bytes as u128 * 3;
	let denominator = avg_mbps.max(1) as u128 * BYTES_PER_MIB * 2 * JOB_POLL_INTERVAL_SECS as u128;
	let attempts = numerator.div_ceil(denominator);
	u64::try_from(attempts)
		.unwrap_or(u64::MAX)
		.max(MIN_JOB_ATTEMPTS)
}

/// Standalone object count and size query over an object store.
#[derive(Clone)]
pub struct SizeEstimator {
	store: Arc<dyn ObjectStore>,
}

impl SizeEstimator {
	pub fn new(store: Arc<dyn ObjectStore>) -> Self {
		Self { store }
	}

	/// List everything under the source prefix. The first listing error is
	/// returned as-is with no partial totals.
	#[instrument(skip(self, source), fields(endpoint = %source.endpoint, bucket = %source.bucket, prefix = %source.prefix))]
	pub async fn summarize(&self, source: &S3Source) -> Result<SizeSummary, ProvisionerError> {
		let summary = summarize(self.store.as_ref(), source).await?;
		tracing::info!(
			objects = summary.object_count,
			bytes = summary.total_bytes,
			"Estimated source size"
		);
		Ok(summary)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use pvci_object_store::MockObjectStore;

	#[test]
	fn capacity_for_nine_megabytes_at_default_overage() {
		assert_eq!(requested_capacity(9_000_000, 25), 11_796_480);
	}

	#[test]
	fn capacity_rounds_up() {
		assert_eq!(requested_capacity(1, 0), 2);
		assert_eq!(requested_capacity(0, 25), 0);
		assert_eq!(requested_capacity(1_000_000, 0), 1_048_576);
	}

	#[test]
	fn small_payloads_get_minimum_attempts() {
		assert_eq!(job_completion_attempts(0, 13), MIN_JOB_ATTEMPTS);
		assert_eq!(job_completion_attempts(9_000_000, 13), MIN_JOB_ATTEMPTS);
	}

	#[test]
	fn large_payloads_scale_attempts() {
		// 13 MiB/s for 100 s of data: 150 s budget / 5 s = 30 checks
		let bytes = 13 * 1_048_576 * 100;
		assert_eq!(estimated_runtime_seconds(bytes, 13), 100.0);
		assert_eq!(job_completion_attempts(bytes, 13), 30);
		assert_eq!(job_completion_attempts(bytes + 1, 13), 31);
	}

	#[tokio::test]
	async fn estimator_totals_store() {
		let estimator = SizeEstimator::new(Arc::new(MockObjectStore::with_sizes(&[
			2_000_000, 3_000_000, 4_000_000,
		])));
		let source = S3Source {
			endpoint: "minio:9000".into(),
			use_tls: false,
			bucket: "b".into(),
			prefix: "".into(),
			access_key: "k".into(),
			secret_key: "s".into(),
		};

		let summary = estimator.summarize(&source).await.unwrap();
		assert_eq!(summary.object_count, 3);
		assert_eq!(summary.total_bytes, 9_000_000);
	}

	proptest! {
		#[test]
		fn capacity_matches_float_formula(bytes in 0u64..1_000_000_000_000, pct in 0u32..500) {
			let exact = requested_capacity(bytes, pct) as f64;
			let float = (bytes as f64 * 1.048576 * (1.0 + pct as f64 / 100.0)).ceil();
			prop_assert!((exact - float).abs() <= 1.0);
		}

		#[test]
		fn capacity_is_monotonic(bytes in 0u64..1_000_000_000_000, extra in 0u64..1_000_000, pct in 0u32..500, extra_pct in 0u32..100) {
			let base = requested_capacity(bytes, pct);
			prop_assert!(requested_capacity(bytes + extra, pct) >= base);
			prop_assert!(requested_capacity(bytes, pct + extra_pct) >= base);
			prop_assert!(base >= bytes);
		}

		#[test]
		fn attempts_match_formula(bytes in 0u64..1_000_000_000_000, rate in 1u32..1000) {
			let runtime = estimated_runtime_seconds(bytes, rate);
			let float = ((runtime * 1.5) / 5.0).ceil().max(6.0);
			let exact = job_completion_attempts(bytes, rate);
			prop_assert!(exact >= MIN_JOB_ATTEMPTS);
			prop_assert!((exact as f64 - float).abs() <= 1.0);
		}
	}
}
