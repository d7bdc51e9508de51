// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8070;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 1200;

/// Server run mode, reported by the info endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
	#[default]
	Release,
	Debug,
	Test,
}

impl ServerMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			ServerMode::Release => "release",
			ServerMode::Debug => "debug",
			ServerMode::Test => "test",
		}
	}
}

impl fmt::Display for ServerMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ServerMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"release" => Ok(ServerMode::Release),
			"debug" => Ok(ServerMode::Debug),
			"test" => Ok(ServerMode::Test),
			other => Err(format!("unknown mode '{other}' (expected release, debug or test)")),
		}
	}
}

/// HTTP server configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	pub read_timeout_secs: u64,
	/// Upper bound on a whole request, including a synchronous provisioning run.
	pub write_timeout_secs: u64,
	pub mode: ServerMode,
}

impl HttpConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.read_timeout_secs + self.write_timeout_secs)
	}
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfigLayer::default().finalize()
	}
}

/// HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub read_timeout_secs: Option<u64>,
	#[serde(default)]
	pub write_timeout_secs: Option<u64>,
	#[serde(default)]
	pub mode: Option<ServerMode>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.read_timeout_secs.is_some() {
			self.read_timeout_secs = other.read_timeout_secs;
		}
		if other.write_timeout_secs.is_some() {
			self.write_timeout_secs = other.write_timeout_secs;
		}
		if other.mode.is_some() {
			self.mode = other.mode;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		HttpConfig {
			host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port: self.port.unwrap_or(DEFAULT_PORT),
			read_timeout_secs: self.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
			write_timeout_secs: self
				.write_timeout_secs
				.unwrap_or(DEFAULT_WRITE_TIMEOUT_SECS),
			mode: self.mode.unwrap_or_default(),
		}
	}
}
