// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Volume provisioning workflow for PVCI.
//!
//! This crate turns an object-store prefix into a read-only persistent volume
//! claim. It sits between the HTTP API (pvci-server) and the cluster and
//! object-store clients (pvci-server-k8s, pvci-object-store), implementing:
//!
//! - Size estimation of the source prefix
//! - The staging claim / copy job / clone workflow with bounded polling
//! - Best-effort compensating cleanup
//! - Status reporting and in-process tracking of running workflows

pub mod backoff;
pub mod config;
pub mod error;
pub mod manifests;
pub mod provisioner;
pub mod sizing;
pub mod status;
pub mod tracker;
pub mod types;

pub use backoff::{BackoffPoller, PollResult, Probe};
pub use config::ProvisionerConfig;
pub use error::ProvisionerError;
pub use provisioner::Provisioner;
pub use pvci_object_store::{S3Source, SizeSummary};
pub use sizing::SizeEstimator;
pub use status::{JobSnapshot, StatusReport, StatusReporter};
pub use tracker::{RunMode, WorkflowOutcome, WorkflowRecord, WorkflowStage, WorkflowTracker};
pub use types::{AccessMode, ProvisioningOutcome, ProvisioningRequest, TargetRef};
