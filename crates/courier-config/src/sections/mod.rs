// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for Courier.

pub mod customerio;
pub mod delivery;
pub mod logging;
pub mod store;

pub use customerio::{
	parse_flag, CustomerIoConfig, CustomerIoConfigLayer, DEFAULT_KNOWN_CUSTOMER_TTL_SECS,
	DEFAULT_TRACK_HOST,
};
pub use delivery::{DeliveryConfig, DeliveryConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use store::{StoreConfig, StoreConfigLayer};
