// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_common_http::{retry, RetryConfig};
use objectiv_tracker_core::EventBatch;

use super::{SharedTransport, TrackerTransport};
use crate::error::Result;

/// Resends a batch after retryable failures, with exponential backoff.
///
/// The same batch is resent each time, so event ids stay stable.
pub struct RetryTransport {
	config: RetryConfig,
	inner: SharedTransport,
}

impl RetryTransport {
	pub fn new(config: RetryConfig, inner: SharedTransport) -> Self {
		Self { config, inner }
	}

	pub fn config(&self) -> &RetryConfig {
		&self.config
	}
}

impl std::fmt::Debug for RetryTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RetryTransport")
			.field("config", &self.config)
			.field("inner", &self.inner.transport_name())
			.finish()
	}
}

#[async_trait]
impl TrackerTransport for RetryTransport {
	fn transport_name(&self) -> &str {
		"RetryTransport"
	}

	fn is_usable(&self) -> bool {
		self.inner.is_usable()
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		retry(&self.config, || self.inner.handle(batch.clone())).await
	}
}
