// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key-value store section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfigLayer {
	/// SQLite URL such as `sqlite:courier.db`. Unset keeps state in memory.
	pub url: Option<String>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			url: self.url.filter(|u| !u.trim().is_empty()),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
	pub url: Option<String>,
}

impl StoreConfig {
	pub fn is_persistent(&self) -> bool {
		self.url.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_in_memory() {
		assert!(!StoreConfigLayer::default().finalize().is_persistent());
	}

	#[test]
	fn test_blank_url_is_in_memory() {
		let config = StoreConfigLayer {
			url: Some("  ".to_string()),
		}
		.finalize();
		assert!(config.url.is_none());
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = StoreConfigLayer {
			url: Some("sqlite:a.db".to_string()),
		};
		base.merge(StoreConfigLayer {
			url: Some("sqlite:b.db".to_string()),
		});
		assert_eq!(base.finalize().url.as_deref(), Some("sqlite:b.db"));
	}
}
