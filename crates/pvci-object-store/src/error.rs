// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

/// Errors that can occur while listing objects.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
	#[error("S3 error: {0}")]
	S3(#[from] s3::error::S3Error),

	#[error("credentials error: {0}")]
	Credentials(#[from] s3::creds::error::CredentialsError),

	/// The store answered but the listing itself failed.
	#[error("listing {bucket}/{prefix} failed: {message}")]
	Listing {
		bucket: String,
		prefix: String,
		message: String,
	},
}
