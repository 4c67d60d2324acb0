// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::load_secret_env;
use crate::error::ConfigError;
use crate::layer::CourierConfigLayer;
use crate::sections::{
	parse_flag, CustomerIoConfigLayer, DeliveryConfigLayer, LogFormat, LoggingConfigLayer,
	StoreConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	HostFields = 30,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<CourierConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<CourierConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(CourierConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/courier/courier.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<CourierConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(CourierConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: CourierConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Plugin fields as delivered by the host, keyed by their camelCase names.
pub struct HostFieldsSource {
	fields: HashMap<String, String>,
}

impl HostFieldsSource {
	pub fn new(fields: HashMap<String, String>) -> Self {
		Self { fields }
	}
}

impl ConfigSource for HostFieldsSource {
	fn name(&self) -> &'static str {
		"host-fields"
	}

	fn precedence(&self) -> Precedence {
		Precedence::HostFields
	}

	fn load(&self) -> Result<CourierConfigLayer, ConfigError> {
		debug!(fields = self.fields.len(), "loading host plugin fields");
		Ok(CourierConfigLayer {
			customerio: Some(CustomerIoConfigLayer::from_host_fields(&self.fields)?),
			..Default::default()
		})
	}
}

/// Environment variable source.
///
/// Convention: COURIER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<CourierConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(CourierConfigLayer {
			customerio: Some(load_customerio_from_env()?),
			delivery: Some(load_delivery_from_env()?),
			store: Some(load_store_from_env()),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_flag(name: &str) -> Result<Option<bool>, ConfigError> {
	env_var(name).map(|v| parse_flag(name, &v)).transpose()
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_customerio_from_env() -> Result<CustomerIoConfigLayer, ConfigError> {
	Ok(CustomerIoConfigLayer {
		site_id: env_var("COURIER_CUSTOMERIO_SITE_ID"),
		token: load_secret_env("COURIER_CUSTOMERIO_TOKEN")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
		host: env_var("COURIER_CUSTOMERIO_HOST"),
		api_host: env_var("COURIER_CUSTOMERIO_API_HOST"),
		events_to_send: env_var("COURIER_CUSTOMERIO_EVENTS_TO_SEND"),
		send_events_from_anonymous_users: env_var("COURIER_CUSTOMERIO_SEND_EVENTS_FROM_ANONYMOUS_USERS"),
		identify_by_email: env_flag("COURIER_CUSTOMERIO_IDENTIFY_BY_EMAIL")?,
		skip_known_customers: env_flag("COURIER_CUSTOMERIO_SKIP_KNOWN_CUSTOMERS")?,
		known_customer_ttl_secs: env_parse("COURIER_CUSTOMERIO_KNOWN_CUSTOMER_TTL_SECS", "u64")?,
	})
}

fn load_delivery_from_env() -> Result<DeliveryConfigLayer, ConfigError> {
	Ok(DeliveryConfigLayer {
		concurrency: env_parse("COURIER_DELIVERY_CONCURRENCY", "usize")?,
		request_timeout_secs: env_parse("COURIER_DELIVERY_REQUEST_TIMEOUT_SECS", "u64")?,
		max_attempts: env_parse("COURIER_DELIVERY_MAX_ATTEMPTS", "u32")?,
	})
}

fn load_store_from_env() -> StoreConfigLayer {
	StoreConfigLayer {
		url: env_var("COURIER_STORE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("COURIER_LOG_LEVEL"),
		format: env_var("COURIER_LOG_FORMAT")
			.map(|v| v.parse::<LogFormat>())
			.transpose()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::HostFields);
		assert!(Precedence::HostFields < Precedence::Environment);
	}

	#[test]
	fn test_host_fields_fill_customerio_only() {
		let fields = HashMap::from([
			("customerioSiteId".to_string(), "site".to_string()),
			("identifyByEmail".to_string(), "Yes".to_string()),
		]);
		let layer = HostFieldsSource::new(fields).load().unwrap();

		let customerio = layer.customerio.unwrap();
		assert_eq!(customerio.site_id.as_deref(), Some("site"));
		assert_eq!(customerio.identify_by_email, Some(true));
		assert!(layer.delivery.is_none());
	}

	#[test]
	fn test_missing_toml_file_is_empty_layer() {
		let layer = TomlSource::new("/nonexistent/courier.toml").load().unwrap();
		assert!(layer.customerio.is_none());
	}

	#[test]
	fn test_toml_file_is_parsed() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[delivery]\nconcurrency = 3").unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.delivery.unwrap().concurrency, Some(3));
	}

	#[test]
	fn test_invalid_toml_reports_path() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[delivery\nconcurrency = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
		assert!(err.to_string().contains(&file.path().display().to_string()));
	}

	#[test]
	fn test_env_parse_rejects_garbage() {
		let var = "COURIER_TEST_ENV_PARSE_8841";
		std::env::set_var(var, "many");
		let result: Result<Option<usize>, _> = env_parse(var, "usize");
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
		std::env::remove_var(var);
	}

	#[test]
	fn test_env_flag_accepts_yes() {
		let var = "COURIER_TEST_ENV_FLAG_8842";
		std::env::set_var(var, "Yes");
		assert_eq!(env_flag(var).unwrap(), Some(true));
		std::env::remove_var(var);
		assert_eq!(env_flag(var).unwrap(), None);
	}
}
