// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod provisioning;
pub mod service;

pub use provisioning::{CreateRequest, S3Request, SizeRequest, SizeResponse, TargetRequest};
pub use service::{EmptyResponse, ErrorResponse, HealthResponse, InfoResponse};
