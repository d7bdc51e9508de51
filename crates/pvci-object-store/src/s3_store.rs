// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::{debug, instrument};

use crate::error::ObjectStoreError;
use crate::store::ObjectStore;
use crate::types::{ObjectEntry, ObjectPage, S3Source};

/// S3-compatible endpoints ignore the region but the signer needs one.
const SIGNING_REGION: &str = "us-east-1";
const DEFAULT_PAGE_SIZE: usize = 1000;

/// Lists objects on any S3-compatible store (MinIO, AWS S3) using rust-s3.
///
/// Stateless: a bucket handle is built from the source on every call since
/// each request carries its own endpoint and credentials.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
	page_size: usize,
}

impl Default for S3ObjectStore {
	fn default() -> Self {
		Self {
			page_size: DEFAULT_PAGE_SIZE,
		}
	}
}

impl S3ObjectStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_page_size(page_size: usize) -> Self {
		Self {
			page_size: page_size.max(1),
		}
	}

	fn bucket(&self, source: &S3Source) -> Result<Box<Bucket>, ObjectStoreError> {
		let region = Region::Custom {
			region: SIGNING_REGION.to_string(),
			endpoint: source.endpoint_url(),
		};
		let credentials = Credentials::new(
			Some(source.access_key.expose().as_str()),
			Some(source.secret_key.expose().as_str()),
			None,
			None,
			None,
		)?;
		let bucket = Bucket::new(&source.bucket, region, credentials)?;
		Ok(bucket.with_path_style())
	}
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
	#[instrument(skip(self, source), fields(bucket = %source.bucket, prefix = %source.prefix))]
	async fn list_page(
		&self,
		source: &S3Source,
		continuation: Option<String>,
	) -> Result<ObjectPage, ObjectStoreError> {
		let bucket = self.bucket(source)?;
		let (result, code) = bucket
			.list_page(
				source.prefix.clone(),
				None,
				continuation,
				None,
				Some(self.page_size),
			)
			.await?;

		if !(200..300).contains(&code) {
			return Err(ObjectStoreError::Listing {
				bucket: source.bucket.clone(),
				prefix: source.prefix.clone(),
				message: format!("unexpected status {code}"),
			});
		}

		let objects: Vec<ObjectEntry> = result
			.contents
			.into_iter()
			.map(|o| ObjectEntry {
				key: o.key,
				size: o.size,
			})
			.collect();
		let next = if result.is_truncated {
			result.next_continuation_token
		} else {
			None
		};
		debug!(objects = objects.len(), truncated = next.is_some(), "Listed page");

		Ok(ObjectPage { objects, next })
	}
}
