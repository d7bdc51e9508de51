// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! PVCI HTTP server library.
//!
//! Exposes the provisioning workflow over JSON endpoints. The binary in
//! `main.rs` wires the router to a live cluster and object store; tests wire
//! it to the in-memory mocks.

pub mod api;
pub mod error;
pub mod routes;

pub use api::{create_app_state, create_router, provisioner_config, AppState};
pub use error::ServerError;
pub use pvci_server_config::ServerConfig;
