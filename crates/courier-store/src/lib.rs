// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key-value storage for plugin state.
//!
//! Values are JSON. Entries may carry a TTL; expired entries read as absent.
//! Two backends are provided: [`MemoryStore`] for a single process and
//! [`SqliteStore`] for state that survives restarts.

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[async_trait]
pub trait KvStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

	/// Store `value` under `key`. With `ttl` set the entry expires after it.
	async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError>;

	async fn get_or(&self, key: &str, default: Value) -> Result<Value, StoreError> {
		Ok(self.get(key).await?.unwrap_or(default))
	}
}

/// Read and deserialize a typed value.
pub async fn get_json<T>(store: &dyn KvStore, key: &str) -> Result<Option<T>, StoreError>
where
	T: DeserializeOwned,
{
	match store.get(key).await? {
		Some(value) => serde_json::from_value(value)
			.map(Some)
			.map_err(|source| StoreError::Corrupt {
				key: key.to_string(),
				source,
			}),
		None => Ok(None),
	}
}

/// Serialize and store a typed value.
pub async fn set_json<T>(
	store: &dyn KvStore,
	key: &str,
	value: &T,
	ttl: Option<Duration>,
) -> Result<(), StoreError>
where
	T: Serialize + Sync,
{
	store.set(key, serde_json::to_value(value)?, ttl).await
}
