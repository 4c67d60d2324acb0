// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Courier.
//!
//! Everything in this crate is pure: no I/O, no clocks except those passed
//! in. It covers:
//!
//! - [`Event`]: the incoming analytics event
//! - [`CustomerStatus`]: monotonic per-customer flags
//! - [`EventsConfig`] and [`EventNameAllowList`]: forwarding policy
//! - [`filter`]: the pass/drop rules
//! - [`email`]: email resolution
//! - [`payload`]: Customer.io request bodies

pub mod email;
pub mod error;
pub mod event;
pub mod filter;
pub mod payload;
pub mod policy;
pub mod status;

pub use email::{extract_email, is_valid_email};
pub use error::PolicyError;
pub use event::{Event, CREATE_ALIAS_EVENT, IDENTIFY_EVENT, PAGEVIEW_EVENT, SCREEN_EVENT};
pub use filter::{evaluate, policy_check, pre_sync_check, should_process, DropReason, FilterVerdict};
pub use payload::{
	customer_identifier, customer_payload, epoch_seconds, track_payload, TrackPayload, TrackType,
};
pub use policy::{EventNameAllowList, EventsConfig};
pub use status::{CustomerFlag, CustomerStatus};
