// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event filtering.
//!
//! Rules run in order and short-circuit:
//! 1. a non-empty allow list must contain the event name
//! 2. `$create_alias` is always dropped
//! 3. the anonymous-user policy must accept the customer's current status
//!
//! Rules 1 and 2 only look at the event and run before customer state is
//! touched. Rule 3 needs the status produced by the sync step.

use std::fmt;

use crate::event::Event;
use crate::policy::{EventNameAllowList, EventsConfig};
use crate::status::{CustomerFlag, CustomerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
	NotInAllowList,
	AliasEvent,
	/// `SEND_IDENTIFIED` and the customer never identified.
	NotIdentified,
	/// `SEND_EMAILS` and no email has been seen for the customer.
	NoEmail,
}

impl DropReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			DropReason::NotInAllowList => "not_in_allow_list",
			DropReason::AliasEvent => "alias_event",
			DropReason::NotIdentified => "customer_not_identified",
			DropReason::NoEmail => "customer_without_email",
		}
	}
}

impl fmt::Display for DropReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
	Pass,
	Drop(DropReason),
}

impl FilterVerdict {
	pub fn is_pass(&self) -> bool {
		matches!(self, FilterVerdict::Pass)
	}
}

/// Rules that depend only on the event itself.
pub fn pre_sync_check(event: &Event, allow_list: &EventNameAllowList) -> FilterVerdict {
	if !allow_list.allows(&event.event) {
		return FilterVerdict::Drop(DropReason::NotInAllowList);
	}
	if event.is_alias() {
		return FilterVerdict::Drop(DropReason::AliasEvent);
	}
	FilterVerdict::Pass
}

/// Policy rule against the freshly synced status.
pub fn policy_check(policy: EventsConfig, status: CustomerStatus) -> FilterVerdict {
	match policy {
		EventsConfig::SendEmails if !status.has(CustomerFlag::WithEmail) => {
			FilterVerdict::Drop(DropReason::NoEmail)
		}
		EventsConfig::SendIdentified if !status.has(CustomerFlag::Identified) => {
			FilterVerdict::Drop(DropReason::NotIdentified)
		}
		_ => FilterVerdict::Pass,
	}
}

/// All rules in order.
pub fn evaluate(
	event: &Event,
	allow_list: &EventNameAllowList,
	policy: EventsConfig,
	status: CustomerStatus,
) -> FilterVerdict {
	match pre_sync_check(event, allow_list) {
		FilterVerdict::Pass => policy_check(policy, status),
		dropped => dropped,
	}
}

pub fn should_process(
	event: &Event,
	allow_list: &EventNameAllowList,
	policy: EventsConfig,
	status: CustomerStatus,
) -> bool {
	evaluate(event, allow_list, policy, status).is_pass()
}
