// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_tracker_core::EventBatch;
use tracing::{debug, Level};

use super::TrackerTransport;
use crate::error::Result;

/// Writes every event to the `tracing` debug log.
///
/// Only usable when debug logging is enabled for this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugTransport;

impl DebugTransport {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl TrackerTransport for DebugTransport {
	fn transport_name(&self) -> &str {
		"DebugTransport"
	}

	fn is_usable(&self) -> bool {
		tracing::enabled!(Level::DEBUG)
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		for event in batch.iter() {
			let json = serde_json::to_string(event)?;
			debug!(
				event_id = %event.id(),
				event_type = event.event_type(),
				event = %json,
				"Tracked event"
			);
		}
		Ok(())
	}
}
