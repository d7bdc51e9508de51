// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ObjectStoreError;
use crate::store::ObjectStore;
use crate::types::{ObjectEntry, ObjectPage, S3Source};

/// Mock object store serving fixed pages.
///
/// Continuation tokens are page indexes. A failing page returns
/// `ObjectStoreError::Listing`.
#[derive(Debug, Clone, Default)]
pub struct MockObjectStore {
	pages: Arc<Vec<Vec<ObjectEntry>>>,
	fail_on_page: Option<usize>,
	requested: Arc<AtomicUsize>,
}

impl MockObjectStore {
	pub fn new(pages: Vec<Vec<ObjectEntry>>) -> Self {
		Self {
			pages: Arc::new(pages),
			fail_on_page: None,
			requested: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Objects of the given sizes, all on one page.
	pub fn with_sizes(sizes: &[u64]) -> Self {
		Self::new(vec![sizes
			.iter()
			.enumerate()
			.map(|(i, size)| ObjectEntry {
				key: format!("object-{i}"),
				size: *size,
			})
			.collect()])
	}

	/// Fail when the zero-based page `index` is requested.
	pub fn fail_on_page(mut self, index: usize) -> Self {
		self.fail_on_page = Some(index);
		self
	}

	/// Number of `list_page` calls served or failed.
	pub fn pages_requested(&self) -> usize {
		self.requested.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ObjectStore for MockObjectStore {
	async fn list_page(
		&self,
		source: &S3Source,
		continuation: Option<String>,
	) -> Result<ObjectPage, ObjectStoreError> {
		self.requested.fetch_add(1, Ordering::SeqCst);
		let index = continuation
			.as_deref()
			.and_then(|t| t.parse::<usize>().ok())
			.unwrap_or(0);

		if self.fail_on_page == Some(index) {
			return Err(ObjectStoreError::Listing {
				bucket: source.bucket.clone(),
				prefix: source.prefix.clone(),
				message: format!("mock failure on page {index}"),
			});
		}

		let objects = self.pages.get(index).cloned().unwrap_or_default();
		let next = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
		Ok(ObjectPage { objects, next })
	}
}
