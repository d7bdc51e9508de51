// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{HttpConfigLayer, InjectorConfigLayer, LoggingConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/pvci/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PVCI_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			logging: Some(load_logging_from_env()),
			injector: Some(load_injector_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Unset and empty variables are both `None`; anything else must parse.
fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	let Some(raw) = env_var(name) else {
		return Ok(None);
	};
	raw.trim()
		.parse()
		.map(Some)
		.map_err(|e| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("{raw:?}: {e}"),
		})
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("PVCI_SERVER_HOST"),
		port: env_parse("PVCI_SERVER_PORT")?,
		read_timeout_secs: env_parse("PVCI_SERVER_READ_TIMEOUT_SECS")?,
		write_timeout_secs: env_parse("PVCI_SERVER_WRITE_TIMEOUT_SECS")?,
		mode: env_parse("PVCI_SERVER_MODE")?,
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("PVCI_SERVER_LOG_LEVEL"),
	}
}

fn load_injector_from_env() -> Result<InjectorConfigLayer, ConfigError> {
	Ok(InjectorConfigLayer {
		volume_overage_percent: env_parse("PVCI_INJECTOR_VOLUME_OVERAGE_PCT")?,
		avg_mbps: env_parse("PVCI_INJECTOR_AVG_MBPS")?,
		mc_image: env_var("PVCI_INJECTOR_MC_IMAGE"),
		job_ttl_secs: env_parse("PVCI_INJECTOR_JOB_TTL_SECS")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sections::ServerMode;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.injector.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[injector]\nmc_image = \"minio/mc:latest\"").unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.injector.unwrap().mc_image,
			Some("minio/mc:latest".to_string())
		);
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[http]\nport = \"not a number\"").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_u32_rejects_garbage() {
		std::env::set_var("PVCI_TEST_ENV_U32_GARBAGE", "lots");
		let err = env_parse::<u32>("PVCI_TEST_ENV_U32_GARBAGE").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PVCI_TEST_ENV_U32_GARBAGE"));
		std::env::remove_var("PVCI_TEST_ENV_U32_GARBAGE");
	}

	#[test]
	fn test_env_empty_value_is_unset() {
		std::env::set_var("PVCI_TEST_ENV_EMPTY", "");
		assert_eq!(env_parse::<u64>("PVCI_TEST_ENV_EMPTY").unwrap(), None);
		std::env::remove_var("PVCI_TEST_ENV_EMPTY");
	}

	#[test]
	fn test_env_mode_parses() {
		std::env::set_var("PVCI_TEST_ENV_MODE", "debug");
		assert_eq!(
			env_parse::<ServerMode>("PVCI_TEST_ENV_MODE").unwrap(),
			Some(ServerMode::Debug)
		);
		std::env::set_var("PVCI_TEST_ENV_MODE", "loud");
		assert!(env_parse::<ServerMode>("PVCI_TEST_ENV_MODE").is_err());
		std::env::remove_var("PVCI_TEST_ENV_MODE");
	}
}
