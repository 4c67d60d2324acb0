// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded retry for a single outbound request.
//!
//! Only errors that classify themselves as retryable get another attempt.
//! For `reqwest::Error` that means the request never got an answer (connect
//! failure or timeout). Status codes are the caller's business.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	/// Total attempts, the first one included. Never below 1.
	pub max_attempts: u32,
	/// Pause before the first retry. Doubles for each later one.
	pub base_delay: Duration,
	pub max_delay: Duration,
	/// Spread each pause over 50%..150% of its nominal length.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 2,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(2),
			jitter: true,
		}
	}
}

impl RetryConfig {
	pub fn no_retry() -> Self {
		Self::default().with_max_attempts(1)
	}

	pub fn with_max_attempts(self, max_attempts: u32) -> Self {
		Self {
			max_attempts: max_attempts.max(1),
			..self
		}
	}

	/// Pause before retry number `retry` (0-based).
	pub fn backoff(&self, retry: u32) -> Duration {
		let nominal = self
			.base_delay
			.saturating_mul(2u32.saturating_pow(retry))
			.min(self.max_delay);
		if self.jitter {
			nominal.mul_f64(0.5 + fastrand::f64())
		} else {
			nominal
		}
	}
}

/// Classifies an error as worth another attempt.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		self.status().is_none() && (self.is_connect() || self.is_timeout())
	}
}

/// Calls `attempt` until it succeeds, returns a non-retryable error, or runs
/// out of attempts. The last error is returned as is.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut attempt: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let max_attempts = cfg.max_attempts.max(1);
	let mut tried = 0;

	loop {
		tried += 1;
		let err = match attempt().await {
			Ok(value) => return Ok(value),
			Err(err) if !err.is_retryable() => return Err(err),
			Err(err) => err,
		};

		if tried == max_attempts {
			warn!(error = ?err, attempts = tried, "request failed, no attempts left");
			return Err(err);
		}

		let pause = cfg.backoff(tried - 1);
		debug!(
			error = ?err,
			attempt = tried,
			max_attempts,
			pause_ms = pause.as_millis() as u64,
			"request failed, retrying"
		);
		tokio::time::sleep(pause).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[derive(Debug)]
	enum Failure {
		Dropped,
		Rejected,
	}

	impl RetryableError for Failure {
		fn is_retryable(&self) -> bool {
			matches!(self, Failure::Dropped)
		}
	}

	fn instant(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(4),
			jitter: false,
		}
	}

	/// Fails with `failure` for the first `failures` calls, then succeeds.
	async fn run(cfg: &RetryConfig, failures: u32, failure: fn() -> Failure) -> (u32, bool) {
		let calls = AtomicU32::new(0);
		let result = retry(cfg, || async {
			if calls.fetch_add(1, Ordering::SeqCst) < failures {
				Err(failure())
			} else {
				Ok(())
			}
		})
		.await;
		(calls.load(Ordering::SeqCst), result.is_ok())
	}

	#[tokio::test]
	async fn rejected_requests_are_not_repeated() {
		assert_eq!(run(&instant(5), u32::MAX, || Failure::Rejected).await, (1, false));
	}

	#[tokio::test]
	async fn default_allows_a_single_retry() {
		let cfg = RetryConfig {
			jitter: false,
			base_delay: Duration::from_millis(1),
			..RetryConfig::default()
		};
		assert_eq!(run(&cfg, u32::MAX, || Failure::Dropped).await, (2, false));
		assert_eq!(run(&cfg, 1, || Failure::Dropped).await, (2, true));
	}

	#[tokio::test]
	async fn no_retry_makes_one_call() {
		assert_eq!(
			run(&RetryConfig::no_retry(), u32::MAX, || Failure::Dropped).await,
			(1, false)
		);
	}

	#[test]
	fn max_attempts_is_clamped() {
		assert_eq!(RetryConfig::default().with_max_attempts(0).max_attempts, 1);
		assert_eq!(RetryConfig::default().with_max_attempts(3).max_attempts, 3);
	}

	#[test]
	fn backoff_doubles_up_to_the_cap() {
		let cfg = instant(10);
		assert_eq!(cfg.backoff(0), Duration::from_millis(1));
		assert_eq!(cfg.backoff(1), Duration::from_millis(2));
		assert_eq!(cfg.backoff(2), Duration::from_millis(4));
		assert_eq!(cfg.backoff(30), Duration::from_millis(4));
	}

	#[test]
	fn jittered_backoff_stays_in_range() {
		let cfg = RetryConfig {
			base_delay: Duration::from_millis(100),
			..RetryConfig::default()
		};
		for _ in 0..50 {
			let pause = cfg.backoff(0);
			assert!(pause >= Duration::from_millis(50));
			assert!(pause <= Duration::from_millis(150));
		}
	}
}
