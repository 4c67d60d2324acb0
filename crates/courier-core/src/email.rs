// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email resolution for an event.
//!
//! Precedence: `$set.email` when valid, then `distinct_id` when it is itself
//! a valid address. `$set_once` and plain properties are not consulted.

use std::sync::LazyLock;

use regex::Regex;

use crate::event::Event;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
	)
	.expect("email pattern compiles")
});

pub fn is_valid_email(candidate: &str) -> bool {
	candidate.trim() == candidate && EMAIL_REGEX.is_match(candidate)
}

pub fn extract_email(event: &Event) -> Option<String> {
	let from_traits = event
		.profile_traits()
		.and_then(|traits| traits.get("email"))
		.and_then(|v| v.as_str())
		.filter(|e| is_valid_email(e));

	from_traits
		.or_else(|| Some(event.distinct_id.as_str()).filter(|id| is_valid_email(id)))
		.map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[test]
	fn accepts_common_addresses() {
		for email in [
			"a@b.com",
			"user.name+tag@example.co.uk",
			"\"quoted local\"@example.org",
			"ops@[10.0.0.1]",
			"x@y-z.io",
		] {
			assert!(is_valid_email(email), "{email}");
		}
	}

	#[test]
	fn rejects_malformed_addresses() {
		for email in [
			"",
			"abc123",
			"a@b",
			"a@b.c",
			"a@@b.com",
			" a@b.com",
			"a@b.com ",
			"a b@c.com",
			".a@b.com",
			"a.@b.com",
			"a@b.c0m",
		] {
			assert!(!is_valid_email(email), "{email}");
		}
	}

	#[test]
	fn set_email_wins() {
		let event = Event::new("e", "user@example.com").with_set(json!({ "email": "a@b.com" }));
		assert_eq!(extract_email(&event).as_deref(), Some("a@b.com"));
	}

	#[test]
	fn falls_back_to_distinct_id() {
		let event = Event::new("e", "user@example.com");
		assert_eq!(extract_email(&event).as_deref(), Some("user@example.com"));
	}

	#[test]
	fn invalid_set_email_falls_back_to_distinct_id() {
		let event = Event::new("e", "user@example.com").with_set(json!({ "email": "nope" }));
		assert_eq!(extract_email(&event).as_deref(), Some("user@example.com"));
	}

	#[test]
	fn nothing_resolvable() {
		assert_eq!(extract_email(&Event::new("e", "abc123")), None);
	}

	#[test]
	fn ignores_set_once_and_properties() {
		let mut event = Event::new("e", "abc123")
			.with_properties(json!({ "email": "p@example.com" }));
		event.set_once = json!({ "email": "o@example.com" }).as_object().cloned();
		assert_eq!(extract_email(&event), None);
	}

	#[test]
	fn reads_nested_properties_set() {
		let event = Event::new("e", "abc123")
			.with_properties(json!({ "$set": { "email": "n@example.com" } }));
		assert_eq!(extract_email(&event).as_deref(), Some("n@example.com"));
	}

	proptest! {
		#[test]
		fn simple_addresses_validate(
			local in "[a-z0-9]{1,10}(\\.[a-z0-9]{1,10}){0,2}",
			domain in "[a-z0-9-]{1,10}",
			tld in "[a-z]{2,6}",
		) {
			let email = format!("{local}@{domain}.{tld}");
			prop_assert!(is_valid_email(&email));
		}

		#[test]
		fn surrounding_whitespace_never_validates(inner in "[a-z]{1,8}@[a-z]{1,8}\\.com", pad in "[ \\t\\n]{1,3}") {
			let padded = format!("{pad}{inner}");
			prop_assert!(!is_valid_email(&padded));
		}
	}
}
