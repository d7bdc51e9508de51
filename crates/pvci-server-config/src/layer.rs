// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{HttpConfigLayer, InjectorConfigLayer, LoggingConfigLayer};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub injector: Option<InjectorConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.injector, other.injector, InjectorConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.http.is_none());
		assert!(base.injector.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.http.as_ref().unwrap().port, Some(9000));
	}

	#[test]
	fn test_merge_other_overwrites() {
		let mut base = ServerConfigLayer {
			injector: Some(InjectorConfigLayer {
				volume_overage_percent: Some(10),
				mc_image: Some("minio/mc:old".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		let other = ServerConfigLayer {
			injector: Some(InjectorConfigLayer {
				volume_overage_percent: Some(40),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(other);
		let injector = base.injector.unwrap();
		assert_eq!(injector.volume_overage_percent, Some(40));
		assert_eq!(injector.mc_image, Some("minio/mc:old".to_string()));
	}

	#[test]
	fn test_deserialize_full_file() {
		let toml_str = r#"
[http]
host = "0.0.0.0"
port = 8080

[logging]
level = "debug"

[injector]
volume_overage_percent = 30
avg_mbps = 50
"#;
		let layer: ServerConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(layer.http.unwrap().port, Some(8080));
		assert_eq!(layer.logging.unwrap().level, Some("debug".to_string()));
		assert_eq!(layer.injector.unwrap().avg_mbps, Some(50));
	}
}
