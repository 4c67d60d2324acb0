// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Courier.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, host
//!   plugin fields, environment)
//! - Consistent environment variable naming (`COURIER_*`)
//! - `*_FILE` support for the Customer.io token
//!
//! # Usage
//!
//! ```ignore
//! use courier_config::load_config;
//!
//! let config = load_config(None, None)?;
//! println!("forwarding to {}", config.customerio.host);
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::CourierConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, HostFieldsSource, Precedence, TomlSource,
};

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved Courier configuration.
#[derive(Debug, Clone, Default)]
pub struct CourierConfig {
	pub customerio: CustomerIoConfig,
	pub delivery: DeliveryConfig,
	pub store: StoreConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`COURIER_*`)
/// 2. Host plugin fields (`customerioSiteId`, `eventsToSend`, ...), when given
/// 3. Config file (`config_file`, or `/etc/courier/courier.toml`)
/// 4. Built-in defaults
pub fn load_config(
	config_file: Option<PathBuf>,
	host_fields: Option<HashMap<String, String>>,
) -> Result<CourierConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(match config_file {
			Some(path) => TomlSource::new(path),
			None => TomlSource::system(),
		}),
	];
	if let Some(fields) = host_fields {
		sources.push(Box::new(HostFieldsSource::new(fields)));
	}
	sources.push(Box::new(EnvSource));
	load_from_sources(sources)
}

/// Load configuration from an explicit set of sources, applied in
/// precedence order.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<CourierConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CourierConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(finalize(merged))
}

/// Finalize a merged layer into resolved config.
pub fn finalize(layer: CourierConfigLayer) -> CourierConfig {
	let customerio = layer.customerio.unwrap_or_default().finalize();
	let delivery = layer.delivery.unwrap_or_default().finalize();
	let store = layer.store.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		host = %customerio.host,
		site_id_set = !customerio.site_id.is_empty(),
		token_set = !customerio.token.is_blank(),
		identify_by_email = customerio.identify_by_email,
		skip_known_customers = customerio.skip_known_customers,
		concurrency = delivery.concurrency,
		persistent_store = store.is_persistent(),
		"Courier configuration loaded"
	);

	CourierConfig {
		customerio,
		delivery,
		store,
		logging,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use courier_common_secret::SecretString;
	use std::io::Write;

	struct FixedSource(Precedence, CourierConfigLayer);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<CourierConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn layer_with_host(host: &str) -> CourierConfigLayer {
		CourierConfigLayer {
			customerio: Some(CustomerIoConfigLayer {
				host: Some(host.to_string()),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(FixedSource(
				Precedence::Environment,
				layer_with_host("env.example.com"),
			)),
			Box::new(FixedSource(
				Precedence::ConfigFile,
				layer_with_host("file.example.com"),
			)),
		])
		.unwrap();
		assert_eq!(config.customerio.host, "env.example.com");
	}

	#[test]
	fn test_host_fields_override_config_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[customerio]\nsite_id = \"from-file\"\nhost = \"file.example.com\"").unwrap();
		let fields = HashMap::from([("customerioSiteId".to_string(), "from-host".to_string())]);

		let config = load_config(Some(file.path().to_path_buf()), Some(fields)).unwrap();
		assert_eq!(config.customerio.site_id, "from-host");
		assert_eq!(config.customerio.host, "file.example.com");
	}

	#[test]
	fn test_finalize_empty_layer_uses_defaults() {
		let config = finalize(CourierConfigLayer::default());
		assert_eq!(config.customerio.host, DEFAULT_TRACK_HOST);
		assert_eq!(config.delivery, DeliveryConfig::default());
		assert!(!config.store.is_persistent());
	}

	#[test]
	fn test_debug_output_redacts_token() {
		let config = finalize(CourierConfigLayer {
			customerio: Some(CustomerIoConfigLayer {
				token: Some(SecretString::from("very-secret-token")),
				..Default::default()
			}),
			..Default::default()
		});
		assert!(!format!("{config:?}").contains("very-secret-token"));
	}
}
