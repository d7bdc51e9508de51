// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request bodies for the provisioning endpoints.
//!
//! Field names follow the wire format existing clients send
//! (`s3_endpoint`, `s3_ssl`, ...). Credentials are held as
//! [`SecretString`] so request bodies can be logged with `{:?}`.

use pvci_common_secret::SecretString;
use pvci_server_injector::{ProvisioningRequest, S3Source, SizeSummary, TargetRef};
use serde::{Deserialize, Serialize};

/// Object-store location and credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Request {
	#[serde(default)]
	pub s3_endpoint: String,
	#[serde(default)]
	pub s3_ssl: bool,
	#[serde(default)]
	pub s3_bucket: String,
	#[serde(default)]
	pub s3_prefix: String,
	#[serde(default)]
	pub s3_key: SecretString,
	#[serde(default)]
	pub s3_secret: SecretString,
}

impl From<S3Request> for S3Source {
	fn from(req: S3Request) -> Self {
		S3Source {
			endpoint: req.s3_endpoint,
			use_tls: req.s3_ssl,
			bucket: req.s3_bucket,
			prefix: req.s3_prefix,
			access_key: req.s3_key,
			secret_key: req.s3_secret,
		}
	}
}

/// Body of `POST /size`.
pub type SizeRequest = S3Request;

/// Response of `POST /size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeResponse {
	pub objects: u64,
	pub bytes: u64,
}

impl From<SizeSummary> for SizeResponse {
	fn from(summary: SizeSummary) -> Self {
		Self {
			objects: summary.object_count,
			bytes: summary.total_bytes,
		}
	}
}

/// Body of `POST /create` and `POST /create-async`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRequest {
	#[serde(flatten)]
	pub s3: S3Request,
	#[serde(default)]
	pub namespace: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub storage_class: String,
}

impl From<CreateRequest> for ProvisioningRequest {
	fn from(req: CreateRequest) -> Self {
		let storage_class = Some(req.storage_class).filter(|s| !s.trim().is_empty());
		ProvisioningRequest {
			source: req.s3.into(),
			target: TargetRef::new(req.namespace, req.name),
			storage_class,
		}
	}
}

/// Body of the endpoints that address an existing target: `status`,
/// `delete`, `cleanup` and `mode/*`.
///
/// Unknown fields are ignored so clients can send their full create body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TargetRequest {
	#[serde(default)]
	pub namespace: String,
	#[serde(default)]
	pub name: String,
}

impl From<TargetRequest> for TargetRef {
	fn from(req: TargetRequest) -> Self {
		TargetRef::new(req.namespace, req.name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const CREATE_BODY: &str = r#"{
		"s3_endpoint": "minio:9000",
		"s3_ssl": true,
		"s3_bucket": "datasets",
		"s3_prefix": "mnist",
		"s3_key": "minio",
		"s3_secret": "minio123",
		"namespace": "ml",
		"name": "mnist",
		"storage_class": "rook-ceph-block"
	}"#;

	#[test]
	fn create_body_converts_to_request() {
		let body: CreateRequest = serde_json::from_str(CREATE_BODY).unwrap();
		let req = ProvisioningRequest::from(body);

		assert_eq!(req.source.endpoint, "minio:9000");
		assert!(req.source.use_tls);
		assert_eq!(req.source.bucket, "datasets");
		assert_eq!(req.source.prefix, "mnist");
		assert_eq!(req.source.access_key.expose(), "minio");
		assert_eq!(req.source.secret_key.expose(), "minio123");
		assert_eq!(req.target, TargetRef::new("ml", "mnist"));
		assert_eq!(req.storage_class.as_deref(), Some("rook-ceph-block"));
	}

	#[test]
	fn blank_storage_class_uses_cluster_default() {
		let body: CreateRequest =
			serde_json::from_str(r#"{"namespace":"ml","name":"mnist","storage_class":" "}"#).unwrap();
		assert_eq!(ProvisioningRequest::from(body).storage_class, None);
	}

	#[test]
	fn debug_output_hides_credentials() {
		let body: CreateRequest = serde_json::from_str(CREATE_BODY).unwrap();
		let debug = format!("{body:?}");
		assert!(!debug.contains("minio123"));
		assert!(debug.contains("datasets"));
	}

	#[test]
	fn target_request_ignores_extra_fields() {
		let body: TargetRequest = serde_json::from_str(CREATE_BODY).unwrap();
		assert_eq!(TargetRef::from(body), TargetRef::new("ml", "mnist"));
	}

	#[test]
	fn size_response_field_names() {
		let resp = SizeResponse::from(SizeSummary {
			object_count: 3,
			total_bytes: 9_000_000,
		});
		assert_eq!(
			serde_json::to_value(resp).unwrap(),
			serde_json::json!({ "objects": 3, "bytes": 9_000_000 })
		);
	}

	proptest! {
		#[test]
		fn size_request_keeps_location(
			endpoint in "[a-z0-9.]{1,20}(:[0-9]{2,5})?",
			bucket in "[a-z0-9-]{3,20}",
			prefix in "[a-z0-9/]{0,30}",
			ssl in any::<bool>(),
		) {
			let body = serde_json::json!({
				"s3_endpoint": endpoint,
				"s3_ssl": ssl,
				"s3_bucket": bucket,
				"s3_prefix": prefix,
			});
			let source = S3Source::from(serde_json::from_value::<SizeRequest>(body).unwrap());
			prop_assert_eq!(&source.endpoint, &endpoint);
			prop_assert_eq!(&source.bucket, &bucket);
			prop_assert_eq!(&source.prefix, &prefix);
			prop_assert_eq!(source.use_tls, ssl);
		}
	}
}
