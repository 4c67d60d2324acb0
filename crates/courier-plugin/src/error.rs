// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use courier_common_http::RetryableError;
use courier_customerio::CustomerIoError;
use courier_store::StoreError;
use thiserror::Error;

/// Setup failures, split into fatal and retryable.
#[derive(Debug, Error)]
pub enum PluginError {
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("Customer.io rejected the site id and API key (HTTP {status})")]
	InvalidCredentials { status: u16 },

	#[error("credential check failed: {0}")]
	CredentialCheck(#[source] CustomerIoError),

	#[error("Customer.io is unavailable: {0}")]
	Unavailable(#[source] CustomerIoError),

	#[error("plugin store error: {0}")]
	Store(#[from] StoreError),
}

impl PluginError {
	/// Fatal errors mean the configuration has to change before setup can
	/// succeed.
	pub fn is_fatal(&self) -> bool {
		!self.is_retryable()
	}
}

impl RetryableError for PluginError {
	fn is_retryable(&self) -> bool {
		match self {
			PluginError::Unavailable(_) => true,
			PluginError::Store(e) => !e.is_fatal(),
			_ => false,
		}
	}
}

/// Failure to deliver a single event. Never aborts the rest of a batch.
#[derive(Debug, Error)]
pub enum ExportError {
	#[error("plugin store error: {0}")]
	Store(#[from] StoreError),

	#[error(transparent)]
	CustomerIo(#[from] CustomerIoError),
}

impl ExportError {
	pub fn is_transient(&self) -> bool {
		match self {
			ExportError::Store(_) => true,
			ExportError::CustomerIo(e) => e.is_transient(),
		}
	}
}
