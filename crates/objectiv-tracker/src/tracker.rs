// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The tracker: enriches, validates and hands events to a transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use objectiv_common_http::RetryConfig;
use objectiv_tracker_core::{now_millis, Context, Event, EventBatch};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TrackerError};
use crate::plugin::{
	ApplicationContextPlugin, PluginRegistry, SharedPlugin, TrackerInfo, TrackerPlugin,
};
use crate::queue::QueueConfig;
use crate::transport::{
	validate_endpoint, BeaconTransport, HttpTransport, QueuedTransport, RetryTransport,
	SharedTransport, TrackerTransport, TransportSwitch,
};

pub const ENV_APPLICATION_ID: &str = "OBJECTIV_APPLICATION_ID";
pub const ENV_ENDPOINT: &str = "OBJECTIV_ENDPOINT";
pub const ENV_TRACKER_ACTIVE: &str = "OBJECTIV_TRACKER_ACTIVE";
pub const ENV_BATCH_SIZE: &str = "OBJECTIV_BATCH_SIZE";
pub const ENV_FLUSH_INTERVAL_MS: &str = "OBJECTIV_FLUSH_INTERVAL_MS";

/// Tracker id used when neither a tracker id nor an application id is set.
pub const DEFAULT_TRACKER_ID: &str = "default";

/// Configuration for the default endpoint transport chain.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
	/// Timeout for collector requests.
	pub request_timeout: Duration,
	pub queue_config: QueueConfig,
	pub retry_config: RetryConfig,
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
			queue_config: QueueConfig::default(),
			retry_config: RetryConfig::default(),
		}
	}
}

/// How long `track_event_with` waits for the queue to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitForQueue {
	pub interval: Duration,
	pub timeout: Duration,
}

impl Default for WaitForQueue {
	fn default() -> Self {
		Self {
			interval: Duration::from_millis(100),
			timeout: Duration::from_secs(5),
		}
	}
}

/// Whether `track_event_with` flushes the queue after waiting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushQueue {
	#[default]
	Never,
	Always,
	/// Only when the wait timed out with events still queued.
	OnTimeout,
}

/// Per-call options for [`Tracker::track_event_with`].
///
/// Both only apply to queued transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackEventOptions {
	pub wait_for_queue: Option<WaitForQueue>,
	pub flush_queue: FlushQueue,
}

/// Builder for constructing a [`Tracker`].
///
/// Exactly one of [`endpoint`](Self::endpoint) and
/// [`transport`](Self::transport) must be set.
pub struct TrackerBuilder {
	application_id: Option<String>,
	tracker_id: Option<String>,
	endpoint: Option<String>,
	transport: Option<SharedTransport>,
	plugins: Vec<SharedPlugin>,
	track_application_context: bool,
	location_stack: Vec<Context>,
	global_contexts: Vec<Context>,
	active: bool,
	config: TrackerConfig,
}

impl TrackerBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			application_id: None,
			tracker_id: None,
			endpoint: None,
			transport: None,
			plugins: Vec::new(),
			track_application_context: true,
			location_stack: Vec::new(),
			global_contexts: Vec::new(),
			active: true,
			config: TrackerConfig::default(),
		}
	}

	/// Seeds a builder from `OBJECTIV_*` environment variables.
	///
	/// Unset variables leave the default in place; unparsable ones are
	/// logged and ignored.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut builder = Self::new();

		if let Some(id) = lookup(ENV_APPLICATION_ID) {
			builder = builder.application_id(id);
		}
		if let Some(endpoint) = lookup(ENV_ENDPOINT) {
			builder = builder.endpoint(endpoint);
		}
		if let Some(value) = lookup(ENV_TRACKER_ACTIVE) {
			match value.trim().to_ascii_lowercase().as_str() {
				"true" | "1" => builder = builder.active(true),
				"false" | "0" => builder = builder.active(false),
				_ => warn!(variable = ENV_TRACKER_ACTIVE, value = %value, "Ignoring invalid value"),
			}
		}
		if let Some(value) = lookup(ENV_BATCH_SIZE) {
			match value.trim().parse::<usize>() {
				Ok(size) if size > 0 => builder.config.queue_config.batch_size = size,
				_ => warn!(variable = ENV_BATCH_SIZE, value = %value, "Ignoring invalid value"),
			}
		}
		if let Some(value) = lookup(ENV_FLUSH_INTERVAL_MS) {
			match value.trim().parse::<u64>() {
				Ok(ms) => builder.config.queue_config.flush_interval = Duration::from_millis(ms),
				Err(_) => {
					warn!(variable = ENV_FLUSH_INTERVAL_MS, value = %value, "Ignoring invalid value")
				}
			}
		}

		builder
	}

	pub fn application_id(mut self, id: impl Into<String>) -> Self {
		self.application_id = Some(id.into());
		self
	}

	/// Defaults to the application id.
	pub fn tracker_id(mut self, id: impl Into<String>) -> Self {
		self.tracker_id = Some(id.into());
		self
	}

	/// Collector URL. Builds the default queued, retrying HTTP transport.
	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());
		self
	}

	/// Uses the given transport as is.
	pub fn transport(mut self, transport: SharedTransport) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Registers a plugin. Plugins run in registration order.
	pub fn plugin(mut self, plugin: impl TrackerPlugin) -> Self {
		self.plugins.push(Arc::new(plugin));
		self
	}

	pub fn shared_plugin(mut self, plugin: SharedPlugin) -> Self {
		self.plugins.push(plugin);
		self
	}

	/// Whether to register an [`ApplicationContextPlugin`] automatically.
	/// Defaults to true.
	pub fn track_application_context(mut self, enabled: bool) -> Self {
		self.track_application_context = enabled;
		self
	}

	/// Adds a location context prefixed to every event's location stack.
	pub fn location_context(mut self, context: Context) -> Self {
		self.location_stack.push(context);
		self
	}

	/// Adds a global context attached to every event.
	pub fn global_context(mut self, context: Context) -> Self {
		self.global_contexts.push(context);
		self
	}

	pub fn active(mut self, active: bool) -> Self {
		self.active = active;
		self
	}

	pub fn queue_config(mut self, config: QueueConfig) -> Self {
		self.config.queue_config = config;
		self
	}

	pub fn retry_config(mut self, config: RetryConfig) -> Self {
		self.config.retry_config = config;
		self
	}

	/// Sets the collector request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets the flush interval of the default queue.
	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.config.queue_config.flush_interval = interval;
		self
	}

	/// Sets the batch size of the default queue.
	pub fn batch_size(mut self, size: usize) -> Self {
		self.config.queue_config.batch_size = size;
		self
	}

	/// Builds the tracker without starting it.
	///
	/// Call [`Tracker::start`] (or use [`build_async`](Self::build_async))
	/// before tracking, so plugins are initialized and the queue is running.
	pub fn build(self) -> Result<Tracker> {
		let application_id = self.application_id;
		let tracker_id = self
			.tracker_id
			.or_else(|| application_id.clone())
			.unwrap_or_else(|| DEFAULT_TRACKER_ID.to_string());

		let transport = match (self.transport, self.endpoint) {
			(Some(_), Some(_)) => return Err(TrackerError::ConflictingTransport),
			(None, None) => return Err(TrackerError::MissingTransport),
			(Some(transport), None) => transport,
			(None, Some(endpoint)) => endpoint_transport(&endpoint, &self.config)?,
		};

		let mut plugins = PluginRegistry::new();
		if let Some(id) = &application_id {
			if self.track_application_context
				&& !self
					.plugins
					.iter()
					.any(|p| p.name() == ApplicationContextPlugin::NAME)
			{
				plugins.add(Arc::new(ApplicationContextPlugin::with_application_id(
					id.clone(),
				)))?;
			}
		}
		for plugin in self.plugins {
			plugins.add(plugin)?;
		}

		info!(
			tracker_id = %tracker_id,
			application_id = application_id.as_deref().unwrap_or("-"),
			transport = transport.transport_name(),
			plugins = ?plugins.names(),
			"Tracker initialized"
		);

		Ok(Tracker {
			inner: Arc::new(TrackerInner {
				info: TrackerInfo {
					application_id,
					..TrackerInfo::new(tracker_id)
				},
				plugins,
				transport,
				location_stack: self.location_stack,
				global_contexts: self.global_contexts,
				active: AtomicBool::new(self.active),
				started: AtomicBool::new(false),
				closed: AtomicBool::new(false),
			}),
		})
	}

	/// Builds and starts the tracker.
	pub async fn build_async(self) -> Result<Tracker> {
		let tracker = self.build()?;
		tracker.start().await;
		Ok(tracker)
	}
}

impl Default for TrackerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// `QueuedTransport(RetryTransport(TransportSwitch[Http, Beacon]))`.
fn endpoint_transport(endpoint: &str, config: &TrackerConfig) -> Result<SharedTransport> {
	validate_endpoint(endpoint)?;
	let switch = TransportSwitch::new(vec![
		Arc::new(HttpTransport::with_timeout(endpoint, config.request_timeout)?),
		Arc::new(BeaconTransport::new(endpoint)?),
	]);
	let retry = RetryTransport::new(config.retry_config.clone(), Arc::new(switch));
	Ok(Arc::new(QueuedTransport::new(
		config.queue_config.clone(),
		Arc::new(retry),
	)))
}

struct TrackerInner {
	info: TrackerInfo,
	plugins: PluginRegistry,
	transport: SharedTransport,
	location_stack: Vec<Context>,
	global_contexts: Vec<Context>,
	active: AtomicBool,
	started: AtomicBool,
	closed: AtomicBool,
}

/// Tracks events through plugins into a transport.
///
/// Cloning is cheap and shares the same pipeline.
///
/// # Example
///
/// ```ignore
/// use objectiv_tracker::{make_press_event, make_pressable_context, Tracker};
///
/// let tracker = Tracker::builder()
///     .application_id("my-app")
///     .endpoint("https://collector.example.com")
///     .build_async()
///     .await?;
///
/// tracker
///     .track_event(make_press_event(vec![make_pressable_context("buy", None)], vec![]))
///     .await?;
///
/// tracker.shutdown().await?;
/// ```
#[derive(Clone)]
pub struct Tracker {
	inner: Arc<TrackerInner>,
}

impl Tracker {
	pub fn builder() -> TrackerBuilder {
		TrackerBuilder::new()
	}

	pub fn tracker_id(&self) -> &str {
		&self.inner.info.tracker_id
	}

	pub fn application_id(&self) -> Option<&str> {
		self.inner.info.application_id.as_deref()
	}

	pub fn info(&self) -> &TrackerInfo {
		&self.inner.info
	}

	pub fn plugins(&self) -> &PluginRegistry {
		&self.inner.plugins
	}

	pub fn transport(&self) -> &SharedTransport {
		&self.inner.transport
	}

	pub fn is_active(&self) -> bool {
		self.inner.active.load(Ordering::SeqCst)
	}

	/// An inactive tracker returns events untouched and sends nothing.
	pub fn set_active(&self, active: bool) {
		self.inner.active.store(active, Ordering::SeqCst);
		debug!(tracker_id = %self.tracker_id(), active, "Tracker activity changed");
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	/// Initializes plugins and starts the queue loop. Runs once.
	pub async fn start(&self) {
		if self.inner.started.swap(true, Ordering::SeqCst) {
			return;
		}
		self.inner.plugins.initialize_all(&self.inner.info).await;
		if let Some(queued) = self.inner.transport.as_queued() {
			queued.start().await;
		}
	}

	pub async fn track_event(&self, event: Event) -> Result<Event> {
		self.track_event_with(event, TrackEventOptions::default())
			.await
	}

	/// Enriches, validates and sends an event, returning it as sent.
	///
	/// Delivery failures are logged, not returned.
	pub async fn track_event_with(
		&self,
		mut event: Event,
		options: TrackEventOptions,
	) -> Result<Event> {
		self.check_closed()?;

		if !self.is_active() {
			debug!(event_type = event.event_type(), "Tracker inactive, event not sent");
			return Ok(event);
		}

		let contexts = event.contexts_mut();
		contexts.prepend_locations(self.inner.location_stack.iter().cloned());
		contexts.extend_global(self.inner.global_contexts.iter().cloned());
		self.inner.plugins.enrich_all(contexts);

		self.inner.plugins.validate_all(&event);

		event.set_sending_time(now_millis());

		debug!(
			event_id = %event.id(),
			event_type = event.event_type(),
			"Tracking event"
		);

		let transport = &self.inner.transport;
		let batch = EventBatch::single(event.clone());

		match transport.as_queued() {
			Some(queued) => {
				if let Err(e) = queued.handle(batch).await {
					error!(event_id = %event.id(), error = %e, "Failed to queue event");
				}
				self.settle_queue(queued, options).await;
			}
			None if transport.is_usable() => {
				if let Err(e) = transport.handle(batch).await {
					error!(
						event_id = %event.id(),
						transport = transport.transport_name(),
						error = %e,
						"Failed to send event"
					);
				}
			}
			None => warn!(
				event_id = %event.id(),
				transport = transport.transport_name(),
				"Transport not usable, event not sent"
			),
		}

		Ok(event)
	}

	async fn settle_queue(&self, queued: &QueuedTransport, options: TrackEventOptions) {
		let emptied = match options.wait_for_queue {
			Some(wait) => queued.wait_until_empty(wait.interval, wait.timeout).await,
			None => true,
		};

		let flush = match options.flush_queue {
			FlushQueue::Never => false,
			FlushQueue::Always => true,
			FlushQueue::OnTimeout => !emptied,
		};

		if flush {
			if let Err(e) = queued.flush().await {
				error!(error = %e, "Failed to flush event queue");
			}
		}
	}

	/// Sends every queued event now. A no-op for direct transports.
	pub async fn flush(&self) -> Result<()> {
		match self.inner.transport.as_queued() {
			Some(queued) => queued.flush().await,
			None => Ok(()),
		}
	}

	/// Flushes and stops the queue. Tracking afterwards returns
	/// [`TrackerError::ClientShutdown`].
	pub async fn shutdown(&self) -> Result<()> {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}

		info!(tracker_id = %self.tracker_id(), "Shutting down tracker");

		if let Some(queued) = self.inner.transport.as_queued() {
			queued.shutdown().await?;
		}

		info!(tracker_id = %self.tracker_id(), "Tracker shutdown complete");
		Ok(())
	}

	fn check_closed(&self) -> Result<()> {
		if self.is_closed() {
			Err(TrackerError::ClientShutdown)
		} else {
			Ok(())
		}
	}
}

impl std::fmt::Debug for Tracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tracker")
			.field("tracker_id", &self.tracker_id())
			.field("application_id", &self.application_id())
			.field("transport", &self.inner.transport.transport_name())
			.field("plugins", &self.inner.plugins)
			.field("active", &self.is_active())
			.field("closed", &self.is_closed())
			.finish()
	}
}
