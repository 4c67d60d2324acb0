// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use courier_config::StoreConfig;
use courier_store::{KvStore, MemoryStore, SqliteStore, StoreError};
use tracing::{info, warn};

/// Opens the configured store. Without a URL state lives only for this run.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>, StoreError> {
	match &config.url {
		Some(url) => {
			let store = SqliteStore::connect(url).await?;
			let purged = store.purge_expired().await?;
			info!(purged, "plugin store opened");
			Ok(Arc::new(store))
		}
		None => {
			warn!("no store url configured, customer state will not persist between runs");
			Ok(Arc::new(MemoryStore::new()))
		}
	}
}
