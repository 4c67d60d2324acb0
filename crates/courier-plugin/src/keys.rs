// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store key layout.

pub const CUSTOMER_STATUS_PREFIX: &str = "customer-status/";
pub const AUTH_VERIFIED_PREFIX: &str = "auth-verified/";
pub const CUSTOMER_EXISTS_PREFIX: &str = "customer-exists/";

pub fn customer_status(distinct_id: &str) -> String {
	format!("{CUSTOMER_STATUS_PREFIX}{distinct_id}")
}

/// Keyed by the header fingerprint, never the header itself.
pub fn auth_verified(fingerprint: &str) -> String {
	format!("{AUTH_VERIFIED_PREFIX}{fingerprint}")
}

pub fn customer_exists(identifier: &str) -> String {
	format!("{CUSTOMER_EXISTS_PREFIX}{identifier}")
}
