// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	CustomerIoConfigLayer, DeliveryConfigLayer, LoggingConfigLayer, StoreConfigLayer,
};

/// Courier configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierConfigLayer {
	#[serde(default)]
	pub customerio: Option<CustomerIoConfigLayer>,
	#[serde(default)]
	pub delivery: Option<DeliveryConfigLayer>,
	#[serde(default)]
	pub store: Option<StoreConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl CourierConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: CourierConfigLayer) {
		merge_option(
			&mut self.customerio,
			other.customerio,
			CustomerIoConfigLayer::merge,
		);
		merge_option(&mut self.delivery, other.delivery, DeliveryConfigLayer::merge);
		merge_option(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
