// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::{KvStore, StoreError};

struct Entry {
	value: Value,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_live(&self, now: Instant) -> bool {
		self.expires_at.map_or(true, |at| now < at)
	}
}

/// In-process store. Expired entries are skipped on read and dropped by
/// [`MemoryStore::purge_expired`].
#[derive(Clone, Default)]
pub struct MemoryStore {
	entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn len(&self) -> usize {
		let now = Instant::now();
		self.entries
			.read()
			.await
			.values()
			.filter(|e| e.is_live(now))
			.count()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	pub async fn purge_expired(&self) -> u64 {
		let now = Instant::now();
		let mut entries = self.entries.write().await;
		let before = entries.len();
		entries.retain(|_, e| e.is_live(now));
		(before - entries.len()) as u64
	}
}

#[async_trait]
impl KvStore for MemoryStore {
	async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
		let now = Instant::now();
		Ok(self
			.entries
			.read()
			.await
			.get(key)
			.filter(|e| e.is_live(now))
			.map(|e| e.value.clone()))
	}

	async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
		let expires_at = ttl.map(|ttl| Instant::now() + ttl);
		self.entries
			.write()
			.await
			.insert(key.to_string(), Entry { value, expires_at });
		Ok(())
	}
}
