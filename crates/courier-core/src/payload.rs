// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request bodies for the Customer.io track API.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::event::{Event, PAGEVIEW_EVENT, SCREEN_EVENT};

const CREATED_AT_KEY: &str = "created_at";
/// Epoch values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 1e11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
	Page,
	Screen,
	Event,
}

impl TrackType {
	pub fn for_event(name: &str) -> Self {
		match name {
			PAGEVIEW_EVENT => TrackType::Page,
			SCREEN_EVENT => TrackType::Screen,
			_ => TrackType::Event,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPayload {
	pub name: String,
	#[serde(rename = "type")]
	pub kind: TrackType,
	pub timestamp: i64,
	pub data: Map<String, Value>,
}

pub fn track_payload(event: &Event, now: DateTime<Utc>) -> TrackPayload {
	TrackPayload {
		name: event.event.clone(),
		kind: TrackType::for_event(&event.event),
		timestamp: event.timestamp_secs(now),
		data: event.track_data(),
	}
}

/// Profile upsert body: profile traits plus `_update`, `identifier` and the
/// resolved email.
pub fn customer_payload(
	event: &Event,
	email: Option<&str>,
	existed_already: bool,
) -> Map<String, Value> {
	let mut body = event.profile_traits().cloned().unwrap_or_default();
	normalize_created_at(&mut body, &event.distinct_id);
	body.insert("_update".to_string(), Value::Bool(existed_already));
	body.insert(
		"identifier".to_string(),
		Value::String(event.distinct_id.clone()),
	);
	if let Some(email) = email {
		body.insert("email".to_string(), Value::String(email.to_string()));
	}
	body
}

/// Identifier used in the customer URL path.
pub fn customer_identifier<'a>(
	event: &'a Event,
	email: Option<&'a str>,
	identify_by_email: bool,
) -> &'a str {
	match email {
		Some(email) if identify_by_email => email,
		_ => &event.distinct_id,
	}
}

fn normalize_created_at(body: &mut Map<String, Value>, distinct_id: &str) {
	let Some(value) = body.get_mut(CREATED_AT_KEY) else {
		return;
	};
	match epoch_seconds(value) {
		Some(secs) => *value = Value::from(secs),
		None => warn!(
			distinct_id,
			created_at = %value,
			"created_at is not a recognizable time, sending it unchanged"
		),
	}
}

/// Whole seconds since the epoch for a JSON time value.
///
/// Accepts numbers (seconds or milliseconds), numeric strings, RFC 3339
/// timestamps, naive `YYYY-MM-DDTHH:MM:SS` times (UTC) and `YYYY-MM-DD` dates.
pub fn epoch_seconds(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_f64().map(seconds_from_number),
		Value::String(s) => parse_time_text(s.trim()),
		_ => None,
	}
}

fn seconds_from_number(n: f64) -> i64 {
	if n.abs() > MILLIS_THRESHOLD {
		(n / 1000.0) as i64
	} else {
		n as i64
	}
}

fn parse_time_text(s: &str) -> Option<i64> {
	if let Ok(n) = s.parse::<f64>() {
		return n.is_finite().then(|| seconds_from_number(n));
	}
	if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
		return Some(dt.timestamp());
	}
	for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
		if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
			return Some(dt.and_utc().timestamp());
		}
	}
	NaiveDate::parse_from_str(s, "%Y-%m-%d")
		.ok()
		.and_then(|d| d.and_hms_opt(0, 0, 0))
		.map(|dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use serde_json::json;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
	}

	#[test]
	fn profile_payload_shape() {
		let event = Event::new("signup", "u1").with_set(json!({ "email": "x@y.com", "plan": "pro" }));
		let body = customer_payload(&event, Some("x@y.com"), false);
		assert_eq!(
			Value::Object(body),
			json!({ "email": "x@y.com", "plan": "pro", "_update": false, "identifier": "u1" })
		);
	}

	#[test]
	fn profile_payload_marks_updates_and_adds_resolved_email() {
		let event = Event::new("e", "user@example.com");
		let body = customer_payload(&event, Some("user@example.com"), true);
		assert_eq!(body["_update"], true);
		assert_eq!(body["email"], "user@example.com");
		assert_eq!(body["identifier"], "user@example.com");
	}

	#[test]
	fn track_payload_for_pageview() {
		let event = Event::new("$pageview", "u1")
			.with_properties(json!({ "url": "/x" }))
			.with_timestamp("2024-01-01T00:00:00Z");
		let body = serde_json::to_value(track_payload(&event, now())).unwrap();
		assert_eq!(
			body,
			json!({ "name": "$pageview", "type": "page", "timestamp": 1704067200, "data": { "url": "/x" } })
		);
	}

	#[test]
	fn track_type_mapping() {
		assert_eq!(TrackType::for_event("$screen"), TrackType::Screen);
		assert_eq!(TrackType::for_event("$identify"), TrackType::Event);
		assert_eq!(TrackType::for_event("pageview"), TrackType::Event);
	}

	#[test]
	fn track_payload_without_timestamp_uses_now() {
		let payload = track_payload(&Event::new("signup", "u1"), now());
		assert_eq!(payload.timestamp, now().timestamp());
		assert!(payload.data.is_empty());
	}

	#[test]
	fn created_at_normalization() {
		let cases = [
			(json!("2024-01-01T00:00:00Z"), json!(1_704_067_200)),
			(json!("2024-01-01"), json!(1_704_067_200)),
			(json!(1_704_067_200_000_i64), json!(1_704_067_200)),
			(json!(1_704_067_200.9), json!(1_704_067_200)),
			(json!("1704067200"), json!(1_704_067_200)),
			(json!("not a date"), json!("not a date")),
			(json!(true), json!(true)),
		];
		for (input, expected) in cases {
			let event = Event::new("e", "u1").with_set(json!({ "created_at": input.clone() }));
			let body = customer_payload(&event, None, false);
			assert_eq!(body["created_at"], expected, "input {input}");
		}
	}

	#[test]
	fn identifier_selection() {
		let event = Event::new("e", "u1");
		assert_eq!(customer_identifier(&event, Some("a@b.com"), true), "a@b.com");
		assert_eq!(customer_identifier(&event, Some("a@b.com"), false), "u1");
		assert_eq!(customer_identifier(&event, None, true), "u1");
	}
}
