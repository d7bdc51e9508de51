// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use pvci_common_secret::SecretString;
use serde::{Deserialize, Serialize};

/// Where to read objects from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Source {
	/// Host and optional port, without scheme.
	pub endpoint: String,
	pub use_tls: bool,
	pub bucket: String,
	pub prefix: String,
	pub access_key: SecretString,
	pub secret_key: SecretString,
}

impl S3Source {
	pub fn scheme(&self) -> &'static str {
		if self.use_tls {
			"https"
		} else {
			"http"
		}
	}

	/// Endpoint URL including scheme.
	pub fn endpoint_url(&self) -> String {
		format!("{}://{}", self.scheme(), self.endpoint)
	}

	/// `endpoint/bucket/prefix`, used to annotate provisioned claims.
	pub fn origin(&self) -> String {
		format!("{}/{}/{}", self.endpoint, self.bucket, self.prefix)
	}
}

/// One listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
	pub key: String,
	pub size: u64,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
	pub objects: Vec<ObjectEntry>,
	/// Token for the next page; `None` on the last page.
	pub next: Option<String>,
}

/// Object count and cumulative size under a prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSummary {
	pub object_count: u64,
	pub total_bytes: u64,
}
