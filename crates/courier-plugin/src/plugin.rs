// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_common_http::RetryConfig;
use courier_config::{CustomerIoConfig, DeliveryConfig};
use courier_core::{policy_check, pre_sync_check, DropReason, Event, FilterVerdict};
use courier_customerio::{AuthorizationContext, CustomerIoClient, CustomerIoError};
use courier_store::KvStore;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::dispatch::dispatch;
use crate::error::{ExportError, PluginError};
use crate::keys;
use crate::policy::ExportPolicy;
use crate::sync::sync_status;

/// What happened to a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
	Sent { upserted: bool },
	Filtered(DropReason),
}

/// Counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
	pub received: usize,
	pub sent: usize,
	pub filtered: usize,
	pub failed: usize,
}

impl ExportSummary {
	fn record(&mut self, result: &Result<EventOutcome, ExportError>) {
		match result {
			Ok(EventOutcome::Sent { .. }) => self.sent += 1,
			Ok(EventOutcome::Filtered(_)) => self.filtered += 1,
			Err(_) => self.failed += 1,
		}
	}

	fn merge(mut self, other: ExportSummary) -> Self {
		self.received += other.received;
		self.sent += other.sent;
		self.filtered += other.filtered;
		self.failed += other.failed;
		self
	}
}

/// A configured, credential-checked exporter. Only [`CustomerIoPlugin::setup`]
/// produces one.
pub struct CustomerIoPlugin {
	client: CustomerIoClient,
	store: Arc<dyn KvStore>,
	policy: ExportPolicy,
	concurrency: usize,
}

impl std::fmt::Debug for CustomerIoPlugin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CustomerIoPlugin")
			.field("client", &self.client)
			.field("policy", &self.policy)
			.field("concurrency", &self.concurrency)
			.finish_non_exhaustive()
	}
}

impl CustomerIoPlugin {
	/// Validates configuration, builds the client and checks the credentials
	/// once per distinct authorization header.
	#[instrument(skip_all, fields(host = %config.host))]
	pub async fn setup(
		config: &CustomerIoConfig,
		delivery: &DeliveryConfig,
		store: Arc<dyn KvStore>,
	) -> Result<Self, PluginError> {
		if config.site_id.trim().is_empty() {
			return Err(PluginError::InvalidConfig(
				"customerioSiteId is required".to_string(),
			));
		}
		if config.token.is_blank() {
			return Err(PluginError::InvalidConfig(
				"customerioToken is required".to_string(),
			));
		}

		let policy = ExportPolicy::from_config(config)?;
		let auth = AuthorizationContext::new(config.site_id.trim(), &config.token);

		let mut builder = CustomerIoClient::builder(auth)
			.track_url(&config.host)
			.timeout(Duration::from_secs(delivery.request_timeout_secs))
			.retry_config(RetryConfig::default().with_max_attempts(delivery.max_attempts));
		if let Some(api_host) = &config.api_host {
			builder = builder.api_url(api_host);
		}
		let client = builder
			.build()
			.map_err(|e| PluginError::InvalidConfig(format!("cannot build Customer.io client: {e}")))?;

		verify_credentials_once(&client, store.as_ref()).await?;

		info!(
			track_url = client.track_url(),
			events_config = %policy.events_config,
			allow_list = policy.allow_list.len(),
			identify_by_email = policy.identify_by_email,
			skip_known_customers = policy.known_customer_ttl.is_some(),
			"Customer.io export ready"
		);

		Ok(Self {
			client,
			store,
			policy,
			concurrency: delivery.concurrency.max(1),
		})
	}

	pub fn policy(&self) -> &ExportPolicy {
		&self.policy
	}

	pub fn client(&self) -> &CustomerIoClient {
		&self.client
	}

	/// Filters, syncs and delivers one event.
	#[instrument(skip_all, fields(distinct_id = %event.distinct_id, event = %event.event))]
	pub async fn export_event(&self, event: &Event) -> Result<EventOutcome, ExportError> {
		if let FilterVerdict::Drop(reason) = pre_sync_check(event, &self.policy.allow_list) {
			debug!(%reason, "event filtered");
			return Ok(EventOutcome::Filtered(reason));
		}

		let sync = sync_status(event, self.store.as_ref()).await?;

		if let FilterVerdict::Drop(reason) = policy_check(self.policy.events_config, sync.status) {
			debug!(%reason, "event filtered");
			return Ok(EventOutcome::Filtered(reason));
		}

		let upserted = dispatch(
			event,
			&sync,
			&self.policy,
			&self.client,
			self.store.as_ref(),
		)
		.await?;

		debug!(upserted, "event exported");
		Ok(EventOutcome::Sent { upserted })
	}

	/// Exports a batch. Events sharing a distinct id go out in order, one at
	/// a time; different customers run concurrently. Failures are logged and
	/// counted, never propagated.
	#[instrument(skip_all, fields(events = events.len(), concurrency = self.concurrency))]
	pub async fn export_events(&self, events: Vec<Event>) -> ExportSummary {
		let received = events.len();

		let summary = stream::iter(group_by_customer(events))
			.map(|group| self.export_group(group))
			.buffer_unordered(self.concurrency)
			.fold(ExportSummary::default(), |total, part| async move {
				total.merge(part)
			})
			.await;

		let summary = ExportSummary { received, ..summary };
		info!(
			received = summary.received,
			sent = summary.sent,
			filtered = summary.filtered,
			failed = summary.failed,
			"batch exported"
		);
		summary
	}

	async fn export_group(&self, group: Vec<Event>) -> ExportSummary {
		let mut summary = ExportSummary::default();
		for event in &group {
			let result = self.export_event(event).await;
			if let Err(e) = &result {
				warn!(
					distinct_id = %event.distinct_id,
					event = %event.event,
					transient = e.is_transient(),
					error = %e,
					"failed to export event"
				);
			}
			summary.record(&result);
		}
		summary
	}
}

async fn verify_credentials_once(
	client: &CustomerIoClient,
	store: &dyn KvStore,
) -> Result<(), PluginError> {
	let key = keys::auth_verified(&client.auth().fingerprint());

	if store.get(&key).await? == Some(Value::Bool(true)) {
		debug!("credentials verified previously, skipping check");
		return Ok(());
	}

	match client.verify_credentials().await {
		Ok(()) => {
			store.set(&key, Value::Bool(true), None).await?;
			info!("Customer.io credentials verified");
			Ok(())
		}
		Err(CustomerIoError::Unauthorized { status }) => {
			Err(PluginError::InvalidCredentials { status })
		}
		Err(e) if e.is_transient() => Err(PluginError::Unavailable(e)),
		Err(e) => Err(PluginError::CredentialCheck(e)),
	}
}

/// Splits a batch per distinct id, keeping first-seen order for groups and
/// arrival order within each.
fn group_by_customer(events: Vec<Event>) -> Vec<Vec<Event>> {
	let mut index: HashMap<String, usize> = HashMap::new();
	let mut groups: Vec<Vec<Event>> = Vec::new();

	for event in events {
		match index.get(&event.distinct_id) {
			Some(&i) => groups[i].push(event),
			None => {
				index.insert(event.distinct_id.clone(), groups.len());
				groups.push(vec![event]);
			}
		}
	}
	groups
}
