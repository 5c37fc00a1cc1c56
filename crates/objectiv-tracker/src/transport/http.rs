// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use async_trait::async_trait;
use objectiv_tracker_core::EventBatch;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{validate_endpoint, TrackerTransport, TransportEnvelope};
use crate::error::{Result, TrackerError};

const NAME: &str = "HttpTransport";

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts batches to the collector and waits for the response.
///
/// Only `200 OK` counts as delivered.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	endpoint: String,
	client: Client,
}

impl HttpTransport {
	pub fn new(endpoint: impl Into<String>) -> Result<Self> {
		Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
	}

	pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
		let client = objectiv_common_http::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| TrackerError::network(NAME, e))?;
		Self::with_client(endpoint, client)
	}

	pub fn with_client(endpoint: impl Into<String>, client: Client) -> Result<Self> {
		let endpoint = endpoint.into();
		validate_endpoint(&endpoint)?;
		Ok(Self { endpoint, client })
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

#[async_trait]
impl TrackerTransport for HttpTransport {
	fn transport_name(&self) -> &str {
		NAME
	}

	/// Always true: the constructor only accepts absolute http(s) endpoints.
	fn is_usable(&self) -> bool {
		true
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		let body = TransportEnvelope::new(&batch).to_body()?;

		debug!(
			endpoint = %self.endpoint,
			count = batch.len(),
			"Sending event batch"
		);

		let response = self
			.client
			.post(&self.endpoint)
			.header(CONTENT_TYPE, "text/plain")
			.body(body)
			.send()
			.await
			.map_err(|e| TrackerError::network(NAME, e))?;

		let status = response.status();
		if status != StatusCode::OK {
			return Err(TrackerError::rejected(
				NAME,
				status.as_u16(),
				response.text().await.unwrap_or_default(),
			));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_invalid_endpoint() {
		assert!(matches!(
			HttpTransport::new("localhost"),
			Err(TrackerError::InvalidEndpoint(_))
		));
	}

	#[test]
	fn non_http_schemes_never_build() {
		for endpoint in ["ftp://collector.example", "file:///tmp/events", "mailto:a@b.c"] {
			assert!(
				HttpTransport::new(endpoint).is_err(),
				"{endpoint} should be rejected"
			);
		}
	}

	#[test]
	fn accepts_http_endpoint() {
		let transport = HttpTransport::new("http://localhost:8081").unwrap();
		assert!(transport.is_usable());
		assert_eq!(transport.endpoint(), "http://localhost:8081");
	}
}
