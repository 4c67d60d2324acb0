// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Customer status synchronization.
//!
//! Reads the stored status for the event's distinct id, adds what this event
//! proves, and writes it back only if it grew.
//!
//! Names other than `seen`, `identified` and `with_email` are ignored on
//! read. A record that is never rewritten keeps them; a rewrite stores only
//! the known flags.

use courier_core::{extract_email, CustomerFlag, CustomerStatus, Event};
use courier_store::{get_json, set_json, KvStore, StoreError};
use tracing::{debug, warn};

use crate::keys;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
	pub status: CustomerStatus,
	/// The customer had been seen before this event.
	pub existed_already: bool,
	pub email: Option<String>,
}

pub async fn sync_status(event: &Event, store: &dyn KvStore) -> Result<SyncOutcome, StoreError> {
	let key = keys::customer_status(&event.distinct_id);

	let previous = match get_json::<CustomerStatus>(store, &key).await {
		Ok(status) => status.unwrap_or_default(),
		Err(StoreError::Corrupt { source, .. }) => {
			warn!(
				distinct_id = %event.distinct_id,
				error = %source,
				"stored customer status is unreadable, starting from empty"
			);
			CustomerStatus::empty()
		}
		Err(e) => return Err(e),
	};

	let existed_already = previous.has(CustomerFlag::Seen);
	let email = extract_email(event);

	let mut status = previous;
	let mut grew = status.insert(CustomerFlag::Seen);
	if event.is_identify() {
		grew |= status.insert(CustomerFlag::Identified);
	}
	if email.is_some() {
		grew |= status.insert(CustomerFlag::WithEmail);
	}

	if grew {
		set_json(store, &key, &status, None).await?;
		debug!(
			distinct_id = %event.distinct_id,
			status = ?status.names(),
			"customer status updated"
		);
	}

	Ok(SyncOutcome {
		status,
		existed_already,
		email,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use courier_store::MemoryStore;
	use proptest::prelude::*;
	use serde_json::json;

	#[tokio::test]
	async fn unknown_names_survive_until_the_status_grows() {
		let store = MemoryStore::new();
		store
			.set("customer-status/u1", json!(["seen", "vip"]), None)
			.await
			.unwrap();

		sync_status(&Event::new("pageview", "u1"), &store).await.unwrap();
		assert_eq!(
			store.get("customer-status/u1").await.unwrap(),
			Some(json!(["seen", "vip"]))
		);

		sync_status(&Event::new("$identify", "u1"), &store).await.unwrap();
		assert_eq!(
			store.get("customer-status/u1").await.unwrap(),
			Some(json!(["seen", "identified"]))
		);
	}

	#[tokio::test]
	async fn first_event_marks_seen() {
		let store = MemoryStore::new();
		let outcome = sync_status(&Event::new("signup", "abc123"), &store)
			.await
			.unwrap();

		assert!(!outcome.existed_already);
		assert_eq!(outcome.email, None);
		assert_eq!(outcome.status.names(), vec!["seen"]);
		assert_eq!(
			store.get("customer-status/abc123").await.unwrap(),
			Some(json!(["seen"]))
		);
	}

	#[tokio::test]
	async fn identify_with_email_sets_all_flags_in_order() {
		let store = MemoryStore::new();
		sync_status(&Event::new("signup", "u1"), &store).await.unwrap();

		let identify = Event::new("$identify", "u1").with_set(json!({ "email": "a@b.com" }));
		let outcome = sync_status(&identify, &store).await.unwrap();

		assert!(outcome.existed_already);
		assert_eq!(outcome.email.as_deref(), Some("a@b.com"));
		assert_eq!(
			store.get("customer-status/u1").await.unwrap(),
			Some(json!(["seen", "identified", "with_email"]))
		);
	}

	#[tokio::test]
	async fn unchanged_status_is_not_rewritten() {
		let store = MemoryStore::new();
		store
			.set("customer-status/u1", json!(["seen", "unknown_flag"]), None)
			.await
			.unwrap();

		sync_status(&Event::new("signup", "u1"), &store).await.unwrap();

		assert_eq!(
			store.get("customer-status/u1").await.unwrap(),
			Some(json!(["seen", "unknown_flag"]))
		);
	}

	#[tokio::test]
	async fn corrupt_status_starts_over() {
		let store = MemoryStore::new();
		store
			.set("customer-status/u1", json!({ "not": "a list" }), None)
			.await
			.unwrap();

		let outcome = sync_status(&Event::new("signup", "u1"), &store).await.unwrap();
		assert!(!outcome.existed_already);
		assert_eq!(
			store.get("customer-status/u1").await.unwrap(),
			Some(json!(["seen"]))
		);
	}

	fn event_strategy() -> impl Strategy<Value = Event> {
		(
			prop_oneof![Just("$identify"), Just("signup"), Just("$pageview")],
			proptest::option::of(prop_oneof![Just("a@b.com"), Just("not-an-email")]),
		)
			.prop_map(|(name, email)| {
				let event = Event::new(name, "user-1");
				match email {
					Some(email) => event.with_set(json!({ "email": email })),
					None => event,
				}
			})
	}

	proptest! {
		#[test]
		fn flags_are_monotonic_across_events(events in proptest::collection::vec(event_strategy(), 1..12)) {
			let runtime = tokio::runtime::Runtime::new().unwrap();
			let store = MemoryStore::new();
			let mut previous = CustomerStatus::empty();

			for event in &events {
				let outcome = runtime.block_on(sync_status(event, &store)).unwrap();
				prop_assert!(outcome.status.contains(previous));
				prop_assert!(outcome.status.has(CustomerFlag::Seen));
				if event.is_identify() {
					prop_assert!(outcome.status.has(CustomerFlag::Identified));
				}
				previous = outcome.status;
			}
		}
	}
}
