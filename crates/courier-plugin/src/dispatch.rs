// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of a filtered event: profile upsert, then event track.

use chrono::Utc;
use courier_core::{customer_identifier, customer_payload, track_payload, Event};
use courier_customerio::CustomerIoClient;
use courier_store::KvStore;
use serde_json::Value;
use tracing::debug;

use crate::error::ExportError;
use crate::keys;
use crate::policy::ExportPolicy;
use crate::sync::SyncOutcome;

/// Sends the event to Customer.io. Returns whether the profile was upserted.
///
/// A failed upsert aborts before the track call.
pub async fn dispatch(
	event: &Event,
	sync: &SyncOutcome,
	policy: &ExportPolicy,
	client: &CustomerIoClient,
	store: &dyn KvStore,
) -> Result<bool, ExportError> {
	let email = sync.email.as_deref();
	let identifier = customer_identifier(event, email, policy.identify_by_email);

	let upsert = match policy.known_customer_ttl {
		Some(_) => !is_known_customer(event, email, identifier, store).await?,
		None => true,
	};

	if upsert {
		let body = customer_payload(event, email, sync.existed_already);
		client.upsert_customer(identifier, &body).await?;
		if let Some(ttl) = policy.known_customer_ttl {
			store
				.set(&keys::customer_exists(identifier), Value::Bool(true), Some(ttl))
				.await?;
		}
	} else {
		debug!(identifier, "customer recently upserted, skipping profile update");
	}

	client
		.track_event(identifier, &track_payload(event, Utc::now()))
		.await?;

	Ok(upsert)
}

/// The upsert can only be skipped when the event carries nothing new for
/// the profile.
async fn is_known_customer(
	event: &Event,
	email: Option<&str>,
	identifier: &str,
	store: &dyn KvStore,
) -> Result<bool, ExportError> {
	if event.is_identify() || event.has_profile_traits() || email.is_some() {
		return Ok(false);
	}
	Ok(store.get(&keys::customer_exists(identifier)).await?.is_some())
}
