// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("stored value for {key} is not valid: {source}")]
	Corrupt {
		key: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl StoreError {
	/// Errors that will not go away by trying again, such as a malformed
	/// store URL.
	pub fn is_fatal(&self) -> bool {
		matches!(self, StoreError::Database(sqlx::Error::Configuration(_)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_configuration_errors_are_fatal() {
		let bad_url = StoreError::Database(sqlx::Error::Configuration("bad url".into()));
		assert!(bad_url.is_fatal());
		assert!(!StoreError::Database(sqlx::Error::PoolTimedOut).is_fatal());
	}
}
