// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Forwarding policy parsed once from configuration.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PolicyError;
use crate::status::{CustomerFlag, CustomerStatus};

pub const SEND_ALL_LABEL: &str = "Send all events";
pub const SEND_EMAILS_LABEL: &str = "Only send events from users with emails";
pub const SEND_IDENTIFIED_LABEL: &str = "Only send events from users that have been identified";

/// Which customers' events are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventsConfig {
	#[default]
	SendAll,
	SendEmails,
	SendIdentified,
}

impl EventsConfig {
	/// Flag a customer must carry for its events to be forwarded.
	pub fn required_flag(&self) -> Option<CustomerFlag> {
		match self {
			EventsConfig::SendAll => None,
			EventsConfig::SendEmails => Some(CustomerFlag::WithEmail),
			EventsConfig::SendIdentified => Some(CustomerFlag::Identified),
		}
	}

	pub fn allows(&self, status: CustomerStatus) -> bool {
		match self.required_flag() {
			Some(flag) => status.has(flag),
			None => true,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			EventsConfig::SendAll => SEND_ALL_LABEL,
			EventsConfig::SendEmails => SEND_EMAILS_LABEL,
			EventsConfig::SendIdentified => SEND_IDENTIFIED_LABEL,
		}
	}

	pub fn short_name(&self) -> &'static str {
		match self {
			EventsConfig::SendAll => "send_all",
			EventsConfig::SendEmails => "send_emails",
			EventsConfig::SendIdentified => "send_identified",
		}
	}
}

impl FromStr for EventsConfig {
	type Err = PolicyError;

	/// Accepts the long labels shown to operators and the short snake_case
	/// names, case-insensitive. Blank text means send everything.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase();
		if normalized.is_empty() {
			return Ok(EventsConfig::SendAll);
		}

		[
			EventsConfig::SendAll,
			EventsConfig::SendEmails,
			EventsConfig::SendIdentified,
		]
		.into_iter()
		.find(|c| c.label().to_ascii_lowercase() == normalized || c.short_name() == normalized)
		.ok_or_else(|| PolicyError::UnknownEventsPolicy(s.to_string()))
	}
}

impl fmt::Display for EventsConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.short_name())
	}
}

/// Event names allowed through. Empty allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventNameAllowList {
	names: Vec<String>,
}

impl EventNameAllowList {
	/// Parses comma-separated names. Entries are trimmed, blanks dropped and
	/// duplicates removed keeping the first occurrence.
	pub fn parse(text: &str) -> Self {
		let mut names: Vec<String> = Vec::new();
		for name in text.split(',').map(str::trim).filter(|n| !n.is_empty()) {
			if !names.iter().any(|n| n == name) {
				names.push(name.to_string());
			}
		}
		Self { names }
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.iter().any(|n| n == name)
	}

	pub fn allows(&self, name: &str) -> bool {
		self.is_empty() || self.contains(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}
}
