// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_tracker_core::EventBatch;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::runtime::Handle;
use tracing::debug;

use super::{validate_endpoint, TrackerTransport, TransportEnvelope};
use crate::error::{Result, TrackerError};

const NAME: &str = "BeaconTransport";

/// Fire-and-forget delivery.
///
/// The request is spawned on the current runtime and `handle` returns as soon
/// as it is queued; the response is never looked at.
#[derive(Debug, Clone)]
pub struct BeaconTransport {
	endpoint: String,
	client: Client,
}

impl BeaconTransport {
	pub fn new(endpoint: impl Into<String>) -> Result<Self> {
		Self::with_client(endpoint, objectiv_common_http::new_client())
	}

	pub fn with_client(endpoint: impl Into<String>, client: Client) -> Result<Self> {
		let endpoint = endpoint.into();
		validate_endpoint(&endpoint)?;
		Ok(Self { endpoint, client })
	}
}

#[async_trait]
impl TrackerTransport for BeaconTransport {
	fn transport_name(&self) -> &str {
		NAME
	}

	fn is_usable(&self) -> bool {
		Handle::try_current().is_ok()
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		let handle = Handle::try_current().map_err(|_| TrackerError::NoUsableTransport)?;
		let body = TransportEnvelope::new(&batch).to_body()?;
		let request = self
			.client
			.post(&self.endpoint)
			.header(CONTENT_TYPE, "text/plain")
			.body(body);

		let count = batch.len();
		handle.spawn(async move {
			if let Err(e) = request.send().await {
				debug!(error = %e, count, "Beacon delivery failed");
			}
		});

		debug!(endpoint = %self.endpoint, count, "Queued beacon");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unusable_outside_runtime() {
		let transport = BeaconTransport::new("http://localhost:8081").unwrap();
		assert!(!transport.is_usable());
	}

	#[tokio::test]
	async fn usable_inside_runtime() {
		let transport = BeaconTransport::new("http://localhost:8081").unwrap();
		assert!(transport.is_usable());
	}

	#[test]
	fn rejects_invalid_endpoint() {
		assert!(BeaconTransport::new("mailto:someone").is_err());
	}
}
