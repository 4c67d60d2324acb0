// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use courier_config::CustomerIoConfig;
use courier_core::{EventNameAllowList, EventsConfig};

use crate::error::PluginError;

/// Immutable export settings, built once during setup and shared by
/// reference with every export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPolicy {
	pub allow_list: EventNameAllowList,
	pub events_config: EventsConfig,
	pub identify_by_email: bool,
	/// TTL of the known-customer marker. `None` upserts on every event.
	pub known_customer_ttl: Option<Duration>,
}

impl ExportPolicy {
	pub fn from_config(config: &CustomerIoConfig) -> Result<Self, PluginError> {
		let events_config = config
			.send_events_from_anonymous_users
			.parse::<EventsConfig>()
			.map_err(|e| PluginError::InvalidConfig(e.to_string()))?;

		Ok(Self {
			allow_list: EventNameAllowList::parse(&config.events_to_send),
			events_config,
			identify_by_email: config.identify_by_email,
			known_customer_ttl: config
				.skip_known_customers
				.then(|| Duration::from_secs(config.known_customer_ttl_secs)),
		})
	}
}
