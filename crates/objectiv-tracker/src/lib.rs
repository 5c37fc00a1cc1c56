// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for tracking Objectiv events.
//!
//! Events carry a location stack (where in the UI something happened) and
//! global contexts (facts about the environment). A [`Tracker`] runs every
//! event through its plugins, which add contexts and validate the result, and
//! hands it to a transport that delivers it to the collector.
//!
//! # Quick Start
//!
//! ```ignore
//! use objectiv_tracker::{
//!     make_press_event, make_pressable_context, PathContextPlugin, Tracker,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Tracker::builder()
//!         .application_id("my-app")
//!         .endpoint("https://collector.example.com")
//!         .plugin(PathContextPlugin::fixed("/checkout"))
//!         .build_async()
//!         .await?;
//!
//!     tracker
//!         .track_event(make_press_event(
//!             vec![make_pressable_context("pay", Some("Pay now".to_string()))],
//!             vec![],
//!         ))
//!         .await?;
//!
//!     // Shutdown gracefully (flushes pending events)
//!     tracker.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Delivery
//!
//! With an endpoint, events are queued and sent in batches by a background
//! loop, through a retrying HTTP transport:
//!
//! ```text
//! QueuedTransport -> RetryTransport -> TransportSwitch [HttpTransport, BeaconTransport]
//! ```
//!
//! Tune it through the builder:
//!
//! ```ignore
//! let tracker = Tracker::builder()
//!     .application_id("my-app")
//!     .endpoint("https://collector.example.com")
//!     .flush_interval(Duration::from_millis(500)) // Flush every 500ms
//!     .batch_size(25)                             // Or when 25 events are queued
//!     .retry_config(RetryConfig::no_retry())
//!     .build()?;
//! ```
//!
//! Any other strategy is a [`TrackerTransport`] passed to
//! [`TrackerBuilder::transport`]; [`TransportGroup`] fans out to several
//! collectors.
//!
//! # Error Handling
//!
//! Tracking never fails because of delivery: send failures are logged through
//! `tracing` and, for queued transports, surface from [`Tracker::flush`].
//! Validation problems are logged as warnings and never block an event.
//!
//! ```ignore
//! use objectiv_tracker::TrackerError;
//!
//! match tracker.flush().await {
//!     Ok(()) => {}
//!     Err(TrackerError::SendFailed { status: Some(status), .. }) => {
//!         eprintln!("Collector rejected the batch: {status}");
//!     }
//!     Err(e) => eprintln!("Flush failed: {e}"),
//! }
//! ```

pub mod error;
pub mod plugin;
pub mod queue;
pub mod repository;
pub mod session;
pub mod tracker;
pub mod transport;

pub use error::{Result, TrackerError};
pub use plugin::{
	ApplicationContextPlugin, HttpContextPlugin, PathContextPlugin, PathProvider, PluginRegistry,
	RootLocationContextPlugin, SessionContextPlugin, SharedPlugin, TrackerInfo, TrackerPlugin,
	UniqueGlobalContextPlugin,
};
pub use queue::{FailedBatchPolicy, QueueConfig, QueueState, QueuedEvent, TrackerQueue};
pub use repository::{trackers, TrackerRepository};
pub use session::{FileSessionStore, MemorySessionStore, SessionIdStore};
pub use tracker::{
	FlushQueue, TrackEventOptions, Tracker, TrackerBuilder, TrackerConfig, WaitForQueue,
	DEFAULT_TRACKER_ID,
};
pub use transport::{
	BeaconTransport, DebugTransport, HttpTransport, QueuedTransport, RetryTransport,
	SharedTransport, SpyTransport, TrackerTransport, TransportEnvelope, TransportGroup,
	TransportSwitch,
};

pub use objectiv_common_http::RetryConfig;

// Re-export the data model so most users only depend on this crate
pub use objectiv_tracker_core::*;
