// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the Customer.io client.

use courier_common_http::RetryableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomerIoError {
	/// Connection-level failure; no HTTP status was received.
	#[error("Transport error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("Request timed out")]
	Timeout,

	#[error("Invalid Customer.io URL {url}: {message}")]
	InvalidUrl { url: String, message: String },

	#[error("Customer.io rejected the credentials (HTTP {status})")]
	Unauthorized { status: u16 },

	#[error("Customer.io API error: {status} - {message}")]
	Api { status: u16, message: String },

	#[error("Invalid response from Customer.io: {0}")]
	InvalidResponse(String),
}

impl CustomerIoError {
	/// HTTP status, when the server answered.
	pub fn status(&self) -> Option<u16> {
		match self {
			CustomerIoError::Unauthorized { status } | CustomerIoError::Api { status, .. } => {
				Some(*status)
			}
			CustomerIoError::Transport(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}

	/// Failures worth retrying at a later time: no answer at all, request
	/// timeout, rate limiting or a server-side error. A request reqwest
	/// could not even build is not one of them.
	pub fn is_transient(&self) -> bool {
		match self {
			CustomerIoError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
			CustomerIoError::Timeout => true,
			CustomerIoError::Api { status, .. } => {
				*status == 408 || *status == 429 || *status >= 500
			}
			CustomerIoError::Unauthorized { .. }
			| CustomerIoError::InvalidUrl { .. }
			| CustomerIoError::InvalidResponse(_) => false,
		}
	}
}

/// Only transport failures are retried in-process. Statuses go back to the
/// caller untouched.
impl RetryableError for CustomerIoError {
	fn is_retryable(&self) -> bool {
		match self {
			CustomerIoError::Transport(e) => e.is_retryable(),
			CustomerIoError::Timeout => true,
			_ => false,
		}
	}
}
