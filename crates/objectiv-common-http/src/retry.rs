// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Resending with exponential backoff.
//!
//! A collector that answers 5xx, 408 or 429, or that cannot be reached at all,
//! is assumed to recover. Anything else is a rejection and is returned at once.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

/// Backoff settings for [`retry`].
///
/// The delay before attempt `n + 1` is `base_delay * backoff_factor^(n - 1)`,
/// capped at `max_delay`. With `jitter` it is scaled by a random factor in
/// `[0.5, 1.5)`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts, the first one included. Zero behaves like one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A config that makes exactly one attempt.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	/// Delay to wait after the given failed attempt (1-based).
	pub fn delay_after(&self, failed_attempt: u32) -> Duration {
		let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
		let secs = (self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent))
			.min(self.max_delay.as_secs_f64());

		let secs = if self.jitter {
			secs * (0.5 + fastrand::f64())
		} else {
			secs
		};

		Duration::from_secs_f64(secs.max(0.0))
	}
}

/// Errors that know whether another attempt could succeed.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

/// Returns true for collector statuses that signal a transient failure.
pub fn is_retryable_status(status: u16) -> bool {
	match StatusCode::from_u16(status) {
		Ok(status) => {
			status.is_server_error()
				|| status == StatusCode::REQUEST_TIMEOUT
				|| status == StatusCode::TOO_MANY_REQUESTS
		}
		Err(_) => false,
	}
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		self.is_timeout()
			|| self.is_connect()
			|| self.status().is_some_and(|s| is_retryable_status(s.as_u16()))
	}
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// configured attempts are used up. The last error is returned.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let max_attempts = cfg.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		let err = match op().await {
			Ok(value) => {
				if attempt > 1 {
					debug!(attempt, "Delivery succeeded after retry");
				}
				return Ok(value);
			}
			Err(err) => err,
		};

		if !err.is_retryable() {
			debug!(error = ?err, attempt, "Not retrying rejected attempt");
			return Err(err);
		}

		if attempt >= max_attempts {
			warn!(error = ?err, attempts = attempt, "Giving up after retries");
			return Err(err);
		}

		let delay = cfg.delay_after(attempt);
		warn!(
			error = ?err,
			attempt,
			max_attempts,
			delay_ms = delay.as_millis() as u64,
			"Attempt failed, retrying"
		);
		tokio::time::sleep(delay).await;
		attempt += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[derive(Debug, PartialEq)]
	enum Outcome {
		Transient,
		Rejected,
	}

	impl RetryableError for Outcome {
		fn is_retryable(&self) -> bool {
			*self == Outcome::Transient
		}
	}

	fn no_jitter(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(1),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	/// Fails with `failure` for the first `failures` calls, then succeeds.
	async fn run(
		cfg: &RetryConfig,
		failures: u32,
		failure: fn() -> Outcome,
	) -> (Result<u32, Outcome>, u32) {
		let counter = AtomicU32::new(0);
		let calls = &counter;
		let result = retry(cfg, || async move {
			let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
			if n <= failures {
				Err(failure())
			} else {
				Ok(n)
			}
		})
		.await;
		(result, counter.load(Ordering::SeqCst))
	}

	#[tokio::test(start_paused = true)]
	async fn rejection_is_not_retried() {
		let (result, calls) = run(&no_jitter(5), u32::MAX, || Outcome::Rejected).await;
		assert_eq!(result, Err(Outcome::Rejected));
		assert_eq!(calls, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn transient_failures_use_every_attempt() {
		let (result, calls) = run(&no_jitter(3), u32::MAX, || Outcome::Transient).await;
		assert_eq!(result, Err(Outcome::Transient));
		assert_eq!(calls, 3);
	}

	#[tokio::test(start_paused = true)]
	async fn recovers_within_budget() {
		let start = tokio::time::Instant::now();
		let (result, calls) = run(&no_jitter(5), 2, || Outcome::Transient).await;

		assert_eq!(result, Ok(3));
		assert_eq!(calls, 3);
		// 100ms after the first failure, 200ms after the second.
		let elapsed = start.elapsed();
		assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
		assert!(elapsed < Duration::from_millis(310), "{elapsed:?}");
	}

	#[tokio::test(start_paused = true)]
	async fn zero_attempts_still_tries_once() {
		let (_, calls) = run(&no_jitter(0), u32::MAX, || Outcome::Transient).await;
		assert_eq!(calls, 1);

		let (_, calls) = run(&RetryConfig::no_retry(), u32::MAX, || Outcome::Transient).await;
		assert_eq!(calls, 1);
	}

	#[test]
	fn backoff_grows_then_caps() {
		let cfg = no_jitter(10);
		let delays: Vec<u64> = (1..=6)
			.map(|n| cfg.delay_after(n).as_millis() as u64)
			.collect();
		assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
	}

	#[test]
	fn jitter_stays_within_half_to_one_and_a_half() {
		let cfg = RetryConfig {
			jitter: true,
			..no_jitter(3)
		};
		for _ in 0..100 {
			let delay = cfg.delay_after(2);
			assert!(delay >= Duration::from_millis(100), "{delay:?}");
			assert!(delay < Duration::from_millis(300), "{delay:?}");
		}
	}

	#[test]
	fn collector_statuses() {
		for status in [408, 429, 500, 502, 503, 504] {
			assert!(is_retryable_status(status), "{status} should be retryable");
		}
		for status in [200, 202, 400, 401, 404, 422, 0] {
			assert!(!is_retryable_status(status), "{status} should not be retryable");
		}
	}
}
