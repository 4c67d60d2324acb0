// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Incoming analytics events.
//!
//! Events arrive from the ingestion pipeline as JSON objects. Only the fields
//! Courier acts on are modelled; anything else is ignored on deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payload::epoch_seconds;

pub const IDENTIFY_EVENT: &str = "$identify";
pub const CREATE_ALIAS_EVENT: &str = "$create_alias";
pub const PAGEVIEW_EVENT: &str = "$pageview";
pub const SCREEN_EVENT: &str = "$screen";

const SET_KEY: &str = "$set";
const SET_ONCE_KEY: &str = "$set_once";

/// An analytics event as delivered by the host.
///
/// # Example
///
/// ```
/// use courier_core::Event;
///
/// let event = Event::new("signup", "user-1")
///     .with_properties(serde_json::json!({ "plan": "pro" }));
/// assert_eq!(event.track_data()["plan"], "pro");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub event: String,
	pub distinct_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<Map<String, Value>>,
	#[serde(rename = "$set", default, skip_serializing_if = "Option::is_none")]
	pub set: Option<Map<String, Value>>,
	#[serde(rename = "$set_once", default, skip_serializing_if = "Option::is_none")]
	pub set_once: Option<Map<String, Value>>,
	/// ISO-8601 string as sent by the pipeline. Numbers are tolerated.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<Value>,
}

impl Event {
	pub fn new(event: impl Into<String>, distinct_id: impl Into<String>) -> Self {
		Self {
			event: event.into(),
			distinct_id: distinct_id.into(),
			properties: None,
			set: None,
			set_once: None,
			timestamp: None,
		}
	}

	/// Sets the event properties. Non-object values are ignored.
	pub fn with_properties(mut self, properties: Value) -> Self {
		if let Value::Object(map) = properties {
			self.properties = Some(map);
		}
		self
	}

	/// Sets the top-level `$set` traits. Non-object values are ignored.
	pub fn with_set(mut self, set: Value) -> Self {
		if let Value::Object(map) = set {
			self.set = Some(map);
		}
		self
	}

	pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
		self.timestamp = Some(Value::String(timestamp.into()));
		self
	}

	pub fn is_identify(&self) -> bool {
		self.event == IDENTIFY_EVENT
	}

	pub fn is_alias(&self) -> bool {
		self.event == CREATE_ALIAS_EVENT
	}

	/// Profile traits: the top-level `$set`, else `properties.$set`.
	pub fn profile_traits(&self) -> Option<&Map<String, Value>> {
		self.set.as_ref().or_else(|| {
			self.properties
				.as_ref()
				.and_then(|p| p.get(SET_KEY))
				.and_then(Value::as_object)
		})
	}

	pub fn has_profile_traits(&self) -> bool {
		self.profile_traits().is_some_and(|t| !t.is_empty())
	}

	/// Event properties without the profile trait keys.
	pub fn track_data(&self) -> Map<String, Value> {
		let mut data = self.properties.clone().unwrap_or_default();
		data.remove(SET_KEY);
		data.remove(SET_ONCE_KEY);
		data
	}

	/// Event time in whole seconds, or `now` when missing or unparseable.
	pub fn timestamp_secs(&self, now: DateTime<Utc>) -> i64 {
		self.timestamp
			.as_ref()
			.and_then(epoch_seconds)
			.unwrap_or_else(|| now.timestamp())
	}
}
