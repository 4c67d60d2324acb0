// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed store.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE courier_kv (
//!     key        TEXT PRIMARY KEY,
//!     value      TEXT NOT NULL,
//!     expires_at INTEGER NULL   -- unix millis
//! )
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{KvStore, StoreError};

#[derive(Clone, Debug)]
pub struct SqliteStore {
	pool: SqlitePool,
}

impl SqliteStore {
	/// Connect to `url` (e.g. `sqlite:courier.db` or `sqlite::memory:`) and
	/// create the table if needed.
	#[tracing::instrument(skip_all)]
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

		// Every connection to an in-memory database gets its own database, and
		// closing that connection drops it. Keep exactly one, forever.
		let pool_options = if url.contains(":memory:") {
			SqlitePoolOptions::new()
				.max_connections(1)
				.min_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
		} else {
			SqlitePoolOptions::new().max_connections(5)
		};

		let pool = pool_options.connect_with(options).await?;

		Self::from_pool(pool).await
	}

	pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS courier_kv (
				key TEXT PRIMARY KEY,
				value TEXT NOT NULL,
				expires_at INTEGER NULL
			)
			"#,
		)
		.execute(&pool)
		.await?;

		tracing::debug!("courier_kv: schema ready");
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Delete expired entries. Returns the number of rows removed.
	#[tracing::instrument(skip(self))]
	pub async fn purge_expired(&self) -> Result<u64, StoreError> {
		let result = sqlx::query(
			r#"
			DELETE FROM courier_kv
			WHERE expires_at IS NOT NULL AND expires_at <= ?1
			"#,
		)
		.bind(now_millis())
		.execute(&self.pool)
		.await?;

		let deleted = result.rows_affected();
		if deleted > 0 {
			tracing::debug!(deleted, "courier_kv: purged expired entries");
		}
		Ok(deleted)
	}
}

fn now_millis() -> i64 {
	Utc::now().timestamp_millis()
}

#[async_trait]
impl KvStore for SqliteStore {
	#[tracing::instrument(skip(self))]
	async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
		let row: Option<(String,)> = sqlx::query_as(
			r#"
			SELECT value
			FROM courier_kv
			WHERE key = ?1
			  AND (expires_at IS NULL OR expires_at > ?2)
			"#,
		)
		.bind(key)
		.bind(now_millis())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|(text,)| {
			serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
				key: key.to_string(),
				source,
			})
		})
		.transpose()
	}

	#[tracing::instrument(skip(self, value))]
	async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
		let expires_at = ttl.map(|ttl| now_millis().saturating_add(ttl.as_millis() as i64));
		let text = serde_json::to_string(&value)?;

		sqlx::query(
			r#"
			INSERT INTO courier_kv (key, value, expires_at)
			VALUES (?1, ?2, ?3)
			ON CONFLICT(key) DO UPDATE SET
				value      = excluded.value,
				expires_at = excluded.expires_at
			"#,
		)
		.bind(key)
		.bind(&text)
		.bind(expires_at)
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	async fn make_store() -> SqliteStore {
		SqliteStore::connect("sqlite::memory:")
			.await
			.expect("Failed to create test store")
	}

	#[tokio::test]
	async fn test_set_and_get() {
		let store = make_store().await;
		store
			.set("customer-status/u1", json!(["seen", "identified"]), None)
			.await
			.unwrap();
		assert_eq!(
			store.get("customer-status/u1").await.unwrap(),
			Some(json!(["seen", "identified"]))
		);
	}

	#[tokio::test]
	async fn test_memory_pool_never_recycles_its_connection() {
		let store = make_store().await;
		let options = store.pool().options();
		assert_eq!(options.get_max_connections(), 1);
		assert_eq!(options.get_min_connections(), 1);
		assert_eq!(options.get_idle_timeout(), None);
		assert_eq!(options.get_max_lifetime(), None);
	}

	#[tokio::test]
	async fn test_malformed_url_is_fatal() {
		let err = SqliteStore::connect("sqlite::memory:?mode=sideways").await.unwrap_err();
		assert!(err.is_fatal(), "{err:?}");
	}

	#[tokio::test]
	async fn test_get_miss() {
		let store = make_store().await;
		assert!(store.get("nope").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_upsert_replaces_value_and_ttl() {
		let store = make_store().await;
		store.set("k", json!(1), Some(Duration::ZERO)).await.unwrap();
		assert!(store.get("k").await.unwrap().is_none());

		store.set("k", json!(2), None).await.unwrap();
		assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
	}

	#[tokio::test]
	async fn test_purge_expired() {
		let store = make_store().await;
		store.set("old", json!(true), Some(Duration::ZERO)).await.unwrap();
		store
			.set("fresh", json!(true), Some(Duration::from_secs(300)))
			.await
			.unwrap();
		store.set("forever", json!(true), None).await.unwrap();

		assert_eq!(store.purge_expired().await.unwrap(), 1);
		assert!(store.get("fresh").await.unwrap().is_some());
		assert!(store.get("forever").await.unwrap().is_some());
	}

	#[tokio::test]
	async fn test_corrupt_row_is_reported() {
		let store = make_store().await;
		sqlx::query("INSERT INTO courier_kv (key, value, expires_at) VALUES ('bad', '{not json', NULL)")
			.execute(store.pool())
			.await
			.unwrap();
		let err = store.get("bad").await.unwrap_err();
		assert!(matches!(err, StoreError::Corrupt { .. }));
	}

	#[tokio::test]
	async fn test_file_database_survives_reconnect() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("state.db").display());

		let store = SqliteStore::connect(&url).await.unwrap();
		store.set("auth-verified/abc", json!(true), None).await.unwrap();
		store.pool().close().await;

		let reopened = SqliteStore::connect(&url).await.unwrap();
		assert_eq!(
			reopened.get("auth-verified/abc").await.unwrap(),
			Some(json!(true))
		);
	}
}
