// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Object-store access for PVCI.
//!
//! Lists every object under a bucket/prefix page by page and totals the
//! object count and byte size. Listing is read-only and never retried.

mod error;
mod mock;
mod s3_store;
mod store;
mod types;

pub use error::ObjectStoreError;
pub use mock::MockObjectStore;
pub use s3_store::S3ObjectStore;
pub use store::{summarize, ObjectStore};
pub use types::{ObjectEntry, ObjectPage, S3Source, SizeSummary};
