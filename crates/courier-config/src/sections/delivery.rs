// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound delivery tuning.

use serde::{Deserialize, Serialize};

fn default_concurrency() -> usize {
	10
}

fn default_request_timeout_secs() -> u64 {
	10
}

fn default_max_attempts() -> u32 {
	2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryConfigLayer {
	/// Distinct ids processed in parallel within one batch.
	pub concurrency: Option<usize>,
	pub request_timeout_secs: Option<u64>,
	/// Attempts per request on transport failure, including the first.
	pub max_attempts: Option<u32>,
}

impl DeliveryConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.concurrency.is_some() {
			self.concurrency = other.concurrency;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
	}

	pub fn finalize(self) -> DeliveryConfig {
		DeliveryConfig {
			concurrency: self.concurrency.unwrap_or_else(default_concurrency).max(1),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or_else(default_request_timeout_secs)
				.max(1),
			max_attempts: self.max_attempts.unwrap_or_else(default_max_attempts).max(1),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryConfig {
	pub concurrency: usize,
	pub request_timeout_secs: u64,
	pub max_attempts: u32,
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			concurrency: default_concurrency(),
			request_timeout_secs: default_request_timeout_secs(),
			max_attempts: default_max_attempts(),
		}
	}
}
