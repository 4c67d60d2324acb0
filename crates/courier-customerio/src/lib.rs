// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Customer.io API client for Courier.
//!
//! Covers the three calls Courier makes:
//!
//! - `GET  {api}/v1/api/info/ip_addresses`: credential check
//! - `PUT  {track}/api/v1/customers/{id}`: profile upsert
//! - `POST {track}/api/v1/customers/{id}/events`: event track
//!
//! Connection failures are retried once by default. HTTP error statuses are
//! returned to the caller as [`CustomerIoError`] values.

mod auth;
mod client;
mod error;

pub use auth::AuthorizationContext;
pub use client::{
	derive_api_url, normalize_base_url, CustomerIoClient, CustomerIoClientBuilder,
	DEFAULT_TRACK_HOST,
};
pub use error::CustomerIoError;
