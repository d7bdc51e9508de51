// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for pvci-server.

pub mod http;
pub mod injector;
pub mod logging;

pub use http::{HttpConfig, HttpConfigLayer, ServerMode};
pub use injector::{InjectorConfig, InjectorConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
