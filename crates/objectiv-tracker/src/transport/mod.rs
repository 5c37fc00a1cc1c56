// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of event batches.
//!
//! Backends ([`HttpTransport`], [`BeaconTransport`], [`DebugTransport`],
//! [`SpyTransport`]) talk to the outside world. Combinators
//! ([`TransportSwitch`], [`TransportGroup`], [`RetryTransport`],
//! [`QueuedTransport`]) compose them into delivery strategies:
//!
//! ```ignore
//! let transport = QueuedTransport::new(
//!     QueueConfig::default(),
//!     Arc::new(RetryTransport::new(
//!         RetryConfig::default(),
//!         Arc::new(TransportSwitch::new(vec![
//!             Arc::new(HttpTransport::new(endpoint)?),
//!             Arc::new(BeaconTransport::new(endpoint)?),
//!         ])),
//!     )),
//! );
//! ```

mod beacon;
mod debug;
mod group;
mod http;
mod queued;
mod retry;
mod spy;
mod switch;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use objectiv_tracker_core::{Event, EventBatch};
use serde::Serialize;

use crate::error::{Result, TrackerError};

pub use beacon::BeaconTransport;
pub use debug::DebugTransport;
pub use group::TransportGroup;
pub use http::HttpTransport;
pub use queued::QueuedTransport;
pub use retry::RetryTransport;
pub use spy::SpyTransport;
pub use switch::TransportSwitch;

/// Something that can deliver a batch of events.
#[async_trait]
pub trait TrackerTransport: Send + Sync + 'static {
	/// Name used in logs and errors.
	fn transport_name(&self) -> &str;

	/// Whether the transport can work in the current environment.
	///
	/// `handle` must not be called on an unusable transport.
	fn is_usable(&self) -> bool;

	/// Delivers the batch.
	async fn handle(&self, batch: EventBatch) -> Result<()>;

	/// The queue behind this transport, if it buffers events.
	fn as_queued(&self) -> Option<&QueuedTransport> {
		None
	}
}

/// Type alias for a shared transport.
pub type SharedTransport = Arc<dyn TrackerTransport>;

/// The request body every HTTP based transport sends.
#[derive(Debug, Serialize)]
pub struct TransportEnvelope<'a> {
	pub events: &'a [Event],
	/// Epoch milliseconds at which the body was built.
	pub transport_time: i64,
}

impl<'a> TransportEnvelope<'a> {
	pub fn new(batch: &'a EventBatch) -> Self {
		Self {
			events: batch.events(),
			transport_time: Utc::now().timestamp_millis(),
		}
	}

	pub fn to_body(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}
}

/// True for absolute `http` and `https` URLs.
pub(crate) fn is_http_url(endpoint: &str) -> bool {
	reqwest::Url::parse(endpoint)
		.map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
		.unwrap_or(false)
}

pub(crate) fn validate_endpoint(endpoint: &str) -> Result<()> {
	if is_http_url(endpoint) {
		Ok(())
	} else {
		Err(TrackerError::InvalidEndpoint(endpoint.to_string()))
	}
}
