// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Customer.io destination section.
//!
//! Field names in TOML are snake_case. Hosts that deliver plugin settings as
//! a flat string map use camelCase keys (`customerioSiteId`, ...); those are
//! accepted through [`CustomerIoConfigLayer::from_host_fields`].

use std::collections::HashMap;

use courier_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_TRACK_HOST: &str = "track.customer.io";
pub const DEFAULT_KNOWN_CUSTOMER_TTL_SECS: u64 = 300;

/// Parse a yes/no style flag. Accepts `yes`, `no`, `true`, `false`, `1` and
/// `0`, case-insensitive.
pub fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"yes" | "true" | "1" => Ok(true),
		"no" | "false" | "0" => Ok(false),
		_ => Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("expected Yes or No, got '{value}'"),
		}),
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerIoConfigLayer {
	pub site_id: Option<String>,
	pub token: Option<SecretString>,
	/// Track API host, with or without scheme.
	pub host: Option<String>,
	/// Overrides the API host derived from `host`.
	pub api_host: Option<String>,
	/// Comma-separated event names; empty forwards everything.
	pub events_to_send: Option<String>,
	pub send_events_from_anonymous_users: Option<String>,
	pub identify_by_email: Option<bool>,
	pub skip_known_customers: Option<bool>,
	pub known_customer_ttl_secs: Option<u64>,
}

impl CustomerIoConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.site_id.is_some() {
			self.site_id = other.site_id;
		}
		if other.token.is_some() {
			self.token = other.token;
		}
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.api_host.is_some() {
			self.api_host = other.api_host;
		}
		if other.events_to_send.is_some() {
			self.events_to_send = other.events_to_send;
		}
		if other.send_events_from_anonymous_users.is_some() {
			self.send_events_from_anonymous_users = other.send_events_from_anonymous_users;
		}
		if other.identify_by_email.is_some() {
			self.identify_by_email = other.identify_by_email;
		}
		if other.skip_known_customers.is_some() {
			self.skip_known_customers = other.skip_known_customers;
		}
		if other.known_customer_ttl_secs.is_some() {
			self.known_customer_ttl_secs = other.known_customer_ttl_secs;
		}
	}

	/// Build a layer from the host's plugin settings map.
	///
	/// Empty strings count as unset. Unknown keys are ignored.
	pub fn from_host_fields(fields: &HashMap<String, String>) -> Result<Self, ConfigError> {
		let get = |key: &str| {
			fields
				.get(key)
				.map(|v| v.trim())
				.filter(|v| !v.is_empty())
				.map(str::to_string)
		};

		let identify_by_email = get("identifyByEmail")
			.map(|v| parse_flag("identifyByEmail", &v))
			.transpose()?;
		let skip_known_customers = get("skipKnownCustomers")
			.map(|v| parse_flag("skipKnownCustomers", &v))
			.transpose()?;
		let known_customer_ttl_secs = get("knownCustomerTtlSecs")
			.map(|v| {
				v.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
					key: "knownCustomerTtlSecs".to_string(),
					message: format!("invalid number of seconds '{v}'"),
				})
			})
			.transpose()?;

		Ok(Self {
			site_id: get("customerioSiteId"),
			token: get("customerioToken").map(SecretString::new),
			host: get("host"),
			api_host: get("apiHost"),
			events_to_send: fields.get("eventsToSend").cloned(),
			send_events_from_anonymous_users: fields.get("sendEventsFromAnonymousUsers").cloned(),
			identify_by_email,
			skip_known_customers,
			known_customer_ttl_secs,
		})
	}

	/// Fill in defaults. Credentials left unset finalize to empty values and
	/// are rejected at plugin setup, where the error is reported as fatal.
	pub fn finalize(self) -> CustomerIoConfig {
		CustomerIoConfig {
			site_id: self.site_id.unwrap_or_default(),
			token: self.token.unwrap_or_else(|| SecretString::new(String::new())),
			host: self.host.unwrap_or_else(|| DEFAULT_TRACK_HOST.to_string()),
			api_host: self.api_host,
			events_to_send: self.events_to_send.unwrap_or_default(),
			send_events_from_anonymous_users: self.send_events_from_anonymous_users.unwrap_or_default(),
			identify_by_email: self.identify_by_email.unwrap_or(false),
			skip_known_customers: self.skip_known_customers.unwrap_or(false),
			known_customer_ttl_secs: self
				.known_customer_ttl_secs
				.unwrap_or(DEFAULT_KNOWN_CUSTOMER_TTL_SECS),
		}
	}
}

#[derive(Debug, Clone)]
pub struct CustomerIoConfig {
	pub site_id: String,
	pub token: SecretString,
	pub host: String,
	pub api_host: Option<String>,
	pub events_to_send: String,
	pub send_events_from_anonymous_users: String,
	pub identify_by_email: bool,
	pub skip_known_customers: bool,
	pub known_customer_ttl_secs: u64,
}

impl Default for CustomerIoConfig {
	fn default() -> Self {
		CustomerIoConfigLayer::default().finalize()
	}
}
