// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::ObjectStoreError;
use crate::types::{ObjectPage, S3Source, SizeSummary};

/// Page-wise, recursive listing of objects under a prefix.
#[async_trait]
pub trait ObjectStore: Send + Sync {
	/// Fetch one page. Pass the previous page's `next` token to continue.
	async fn list_page(
		&self,
		source: &S3Source,
		continuation: Option<String>,
	) -> Result<ObjectPage, ObjectStoreError>;
}

/// Walk every page under the source prefix and total the objects.
///
/// The first failing page aborts the walk; partial totals are discarded.
#[instrument(skip(store, source), fields(bucket = %source.bucket, prefix = %source.prefix))]
pub async fn summarize(
	store: &dyn ObjectStore,
	source: &S3Source,
) -> Result<SizeSummary, ObjectStoreError> {
	let mut summary = SizeSummary::default();
	let mut continuation = None;
	let mut pages = 0u32;

	loop {
		let page = store.list_page(source, continuation).await?;
		pages += 1;
		for object in &page.objects {
			summary.object_count += 1;
			summary.total_bytes += object.size;
		}
		match page.next {
			Some(token) => continuation = Some(token),
			None => break,
		}
	}

	debug!(
		pages,
		objects = summary.object_count,
		bytes = summary.total_bytes,
		"Summarized prefix"
	);
	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockObjectStore;
	use crate::types::ObjectEntry;
	use proptest::prelude::*;

	fn source() -> S3Source {
		S3Source {
			endpoint: "minio:9000".into(),
			use_tls: false,
			bucket: "b".into(),
			prefix: "p".into(),
			access_key: "k".into(),
			secret_key: "s".into(),
		}
	}

	fn entry(key: &str, size: u64) -> ObjectEntry {
		ObjectEntry {
			key: key.into(),
			size,
		}
	}

	#[tokio::test]
	async fn totals_every_page() {
		let store = MockObjectStore::new(vec![
			vec![entry("a", 1_000_000), entry("b", 3_000_000)],
			vec![entry("c", 5_000_000)],
		]);

		let summary = summarize(&store, &source()).await.unwrap();
		assert_eq!(
			summary,
			SizeSummary {
				object_count: 3,
				total_bytes: 9_000_000
			}
		);
		assert_eq!(store.pages_requested(), 2);
	}

	#[tokio::test]
	async fn empty_prefix_is_zero() {
		let store = MockObjectStore::new(vec![]);
		let summary = summarize(&store, &source()).await.unwrap();
		assert_eq!(summary, SizeSummary::default());
	}

	#[tokio::test]
	async fn failing_page_aborts_without_partial_totals() {
		let store = MockObjectStore::new(vec![vec![entry("a", 1)], vec![entry("b", 2)], vec![entry("c", 3)]])
			.fail_on_page(1);

		let err = summarize(&store, &source()).await.unwrap_err();
		assert!(matches!(err, ObjectStoreError::Listing { .. }));
		assert_eq!(store.pages_requested(), 2);
	}

	proptest! {
		#[test]
		fn summary_matches_flattened_sizes(pages in prop::collection::vec(prop::collection::vec(0u64..10_000_000, 0..5), 0..5)) {
			let expected_count: u64 = pages.iter().map(|p| p.len() as u64).sum();
			let expected_bytes: u64 = pages.iter().flatten().sum();
			let store = MockObjectStore::new(
				pages
					.iter()
					.map(|p| p.iter().enumerate().map(|(i, s)| entry(&i.to_string(), *s)).collect())
					.collect(),
			);

			let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
			let summary = rt.block_on(summarize(&store, &source())).unwrap();
			prop_assert_eq!(summary.object_count, expected_count);
			prop_assert_eq!(summary.total_bytes, expected_bytes);
		}
	}
}
