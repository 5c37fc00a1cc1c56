// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Buffered delivery with a background flush loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use objectiv_tracker_core::EventBatch;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{SharedTransport, TrackerTransport};
use crate::error::{Result, TrackerError};
use crate::queue::{FailedBatchPolicy, QueueConfig, QueueState, TrackerQueue};

struct QueuedInner {
	config: QueueConfig,
	queue: TrackerQueue,
	transport: SharedTransport,
	shutdown: AtomicBool,
	flush_notify: Notify,
	flush_lock: Mutex<()>,
	task: Mutex<Option<JoinHandle<()>>>,
}

/// Buffers events in a [`TrackerQueue`] and drains them into an inner
/// transport, on an interval or once `batch_size` events are waiting.
///
/// Cloning shares the same queue and loop.
#[derive(Clone)]
pub struct QueuedTransport {
	inner: Arc<QueuedInner>,
}

impl QueuedTransport {
	pub fn new(config: QueueConfig, transport: SharedTransport) -> Self {
		let queue = TrackerQueue::new(config.max_queue_size);
		Self {
			inner: Arc::new(QueuedInner {
				config,
				queue,
				transport,
				shutdown: AtomicBool::new(false),
				flush_notify: Notify::new(),
				flush_lock: Mutex::new(()),
				task: Mutex::new(None),
			}),
		}
	}

	pub fn config(&self) -> &QueueConfig {
		&self.inner.config
	}

	pub fn queue(&self) -> &TrackerQueue {
		&self.inner.queue
	}

	pub async fn queue_len(&self) -> usize {
		self.inner.queue.len().await
	}

	pub fn is_shutdown(&self) -> bool {
		self.inner.shutdown.load(Ordering::SeqCst)
	}

	/// Sends everything currently buffered.
	///
	/// Batches go out concurrently; completion order is not guaranteed.
	/// Returns the first delivery error, after applying the failed batch
	/// policy to every failed batch.
	pub async fn flush(&self) -> Result<()> {
		let inner = &self.inner;
		let _guard = inner.flush_lock.lock().await;

		inner.queue.set_draining(true).await;
		let mut batches = Vec::new();
		loop {
			let events = inner.queue.dequeue(inner.config.batch_size.max(1)).await;
			if events.is_empty() {
				break;
			}
			batches.push(events);
		}

		if batches.is_empty() {
			inner.queue.set_draining(false).await;
			return Ok(());
		}

		debug!(
			batches = batches.len(),
			transport = inner.transport.transport_name(),
			"Flushing event queue"
		);

		let sends = batches.iter().map(|events| {
			let batch = EventBatch::new(events.iter().map(|q| q.event.clone()).collect());
			async move {
				match batch {
					Ok(batch) => inner.transport.handle(batch).await,
					Err(e) => Err(TrackerError::from(e)),
				}
			}
		});
		let results = join_all(sends).await;

		let mut first_error = None;
		let mut failed = Vec::new();
		for (events, result) in batches.into_iter().zip(results) {
			if let Err(e) = result {
				error!(
					count = events.len(),
					error = %e,
					"Failed to deliver event batch"
				);
				if inner.config.failed_batch_policy == FailedBatchPolicy::Requeue {
					failed.extend(events);
				}
				first_error.get_or_insert(e);
			}
		}

		if !failed.is_empty() {
			warn!(count = failed.len(), "Requeueing undelivered events");
			inner.queue.requeue_front(failed).await;
		}
		inner.queue.set_draining(false).await;

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	/// Runs the flush loop until [`shutdown`](Self::shutdown), then flushes
	/// one last time.
	///
	/// Every wake-up, timer or notify, drains the whole queue through
	/// [`flush`](Self::flush), not a single batch.
	pub async fn run(&self) {
		let inner = &self.inner;
		info!(
			flush_interval_ms = inner.config.flush_interval.as_millis() as u64,
			batch_size = inner.config.batch_size,
			"Starting event queue"
		);

		loop {
			tokio::select! {
				_ = tokio::time::sleep(inner.config.flush_interval) => {}
				_ = inner.flush_notify.notified() => {}
			}

			if self.is_shutdown() {
				break;
			}

			if let Err(e) = self.flush().await {
				error!(error = %e, "Failed to flush event queue");
			}
		}

		if let Err(e) = self.flush().await {
			error!(error = %e, "Failed to flush event queue on shutdown");
		}

		info!("Event queue stopped");
	}

	/// Spawns [`run`](Self::run) on the current runtime. Calling it again
	/// while the loop is running does nothing.
	pub async fn start(&self) {
		let mut task = self.inner.task.lock().await;
		if task.is_some() || self.is_shutdown() {
			return;
		}
		let this = self.clone();
		*task = Some(tokio::spawn(async move {
			this.run().await;
		}));
	}

	/// Stops the loop after a final flush. Idempotent.
	pub async fn shutdown(&self) -> Result<()> {
		if self.inner.shutdown.swap(true, Ordering::SeqCst) {
			return Ok(());
		}

		self.inner.flush_notify.notify_one();

		let handle = self.inner.task.lock().await.take();
		match handle {
			Some(handle) => {
				if let Err(e) = handle.await {
					error!(error = %e, "Error waiting for event queue to stop");
				}
				Ok(())
			}
			None => self.flush().await,
		}
	}

	/// Polls until the queue is empty and idle, or `timeout` expires.
	///
	/// Returns whether the queue emptied in time.
	pub async fn wait_until_empty(&self, interval: Duration, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		loop {
			if self.inner.queue.state().await == QueueState::Empty {
				return true;
			}
			let now = Instant::now();
			if now >= deadline {
				return false;
			}
			tokio::time::sleep(interval.min(deadline - now)).await;
		}
	}
}

impl std::fmt::Debug for QueuedTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QueuedTransport")
			.field("config", &self.inner.config)
			.field("transport", &self.inner.transport.transport_name())
			.field("shutdown", &self.is_shutdown())
			.finish()
	}
}

#[async_trait]
impl TrackerTransport for QueuedTransport {
	fn transport_name(&self) -> &str {
		"QueuedTransport"
	}

	fn is_usable(&self) -> bool {
		self.inner.transport.is_usable()
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		if self.is_shutdown() {
			return Err(TrackerError::ClientShutdown);
		}

		let mut len = 0;
		for event in batch {
			len = self.inner.queue.enqueue(event).await;
		}

		if len >= self.inner.config.batch_size {
			self.inner.flush_notify.notify_one();
		}
		Ok(())
	}

	fn as_queued(&self) -> Option<&QueuedTransport> {
		Some(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::SpyTransport;
	use objectiv_tracker_core::{Event, EventId};

	fn config(batch_size: usize, policy: FailedBatchPolicy) -> QueueConfig {
		QueueConfig {
			batch_size,
			flush_interval: Duration::from_secs(60),
			max_queue_size: 100,
			failed_batch_policy: policy,
		}
	}

	fn batch_of(n: usize) -> EventBatch {
		EventBatch::new((0..n).map(|i| Event::new(format!("Event{i}"))).collect()).unwrap()
	}

	#[tokio::test]
	async fn handle_only_enqueues() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(10, FailedBatchPolicy::Discard), spy.clone());

		queued.handle(batch_of(3)).await.unwrap();

		assert_eq!(queued.queue_len().await, 3);
		assert_eq!(spy.batch_count().await, 0);
	}

	#[tokio::test]
	async fn flush_splits_into_batches_in_order() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(2, FailedBatchPolicy::Discard), spy.clone());

		let batch = batch_of(5);
		let ids = batch.ids();
		queued.handle(batch).await.unwrap();
		queued.flush().await.unwrap();

		let mut sizes: Vec<usize> = spy.batches().await.iter().map(|b| b.len()).collect();
		sizes.sort_unstable();
		assert_eq!(sizes, vec![1, 2, 2]);

		let mut delivered: Vec<EventId> = spy.events().await.iter().map(|e| e.id()).collect();
		let mut expected = ids.clone();
		delivered.sort_by_key(|id| id.to_string());
		expected.sort_by_key(|id| id.to_string());
		assert_eq!(delivered, expected);
		assert_eq!(queued.queue_len().await, 0);
	}

	#[tokio::test]
	async fn flush_of_empty_queue_sends_nothing() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(2, FailedBatchPolicy::Discard), spy.clone());

		queued.flush().await.unwrap();
		assert_eq!(spy.batch_count().await, 0);
	}

	#[tokio::test]
	async fn discard_policy_drops_failed_batch() {
		let spy = Arc::new(SpyTransport::new());
		spy.set_failing(true);
		let queued = QueuedTransport::new(config(10, FailedBatchPolicy::Discard), spy.clone());

		queued.handle(batch_of(2)).await.unwrap();
		let result = queued.flush().await;

		assert!(result.unwrap_err().is_send_failure());
		assert_eq!(queued.queue_len().await, 0);
	}

	#[tokio::test]
	async fn requeue_policy_keeps_failed_batch() {
		let spy = Arc::new(SpyTransport::new());
		spy.set_failing(true);
		let queued = QueuedTransport::new(config(10, FailedBatchPolicy::Requeue), spy.clone());

		let batch = batch_of(2);
		let ids = batch.ids();
		queued.handle(batch).await.unwrap();
		assert!(queued.flush().await.is_err());
		assert_eq!(queued.queue_len().await, 2);

		spy.set_failing(false);
		queued.flush().await.unwrap();

		let delivered: Vec<EventId> = spy.events().await.iter().map(|e| e.id()).collect();
		assert_eq!(delivered, ids);
	}

	#[tokio::test(start_paused = true)]
	async fn loop_flushes_on_interval() {
		let spy = Arc::new(SpyTransport::new());
		let mut cfg = config(10, FailedBatchPolicy::Discard);
		cfg.flush_interval = Duration::from_millis(100);
		let queued = QueuedTransport::new(cfg, spy.clone());
		queued.start().await;

		queued.handle(batch_of(1)).await.unwrap();
		tokio::time::sleep(Duration::from_millis(250)).await;

		assert_eq!(spy.batch_count().await, 1);
		queued.shutdown().await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn reaching_batch_size_triggers_flush() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(3, FailedBatchPolicy::Discard), spy.clone());
		queued.start().await;

		queued.handle(batch_of(2)).await.unwrap();
		tokio::task::yield_now().await;
		assert_eq!(spy.batch_count().await, 0);

		queued.handle(batch_of(1)).await.unwrap();
		assert!(
			queued
				.wait_until_empty(Duration::from_millis(5), Duration::from_secs(1))
				.await
		);
		assert_eq!(spy.events().await.len(), 3);
		queued.shutdown().await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn one_wake_up_drains_the_backlog() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(2, FailedBatchPolicy::Discard), spy.clone());
		queued.start().await;

		queued.handle(batch_of(5)).await.unwrap();
		tokio::time::sleep(Duration::from_millis(10)).await;

		// Well before the 60s interval: all three batches came from one flush.
		assert_eq!(spy.batch_count().await, 3);
		assert_eq!(spy.events().await.len(), 5);
		assert_eq!(queued.queue().state().await, QueueState::Empty);
		queued.shutdown().await.unwrap();
	}

	#[tokio::test]
	async fn shutdown_flushes_and_rejects_new_events() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(10, FailedBatchPolicy::Discard), spy.clone());
		queued.start().await;

		queued.handle(batch_of(4)).await.unwrap();
		queued.shutdown().await.unwrap();
		queued.shutdown().await.unwrap();

		assert_eq!(spy.events().await.len(), 4);
		assert!(matches!(
			queued.handle(batch_of(1)).await,
			Err(TrackerError::ClientShutdown)
		));
	}

	#[tokio::test]
	async fn shutdown_without_loop_still_flushes() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(10, FailedBatchPolicy::Discard), spy.clone());

		queued.handle(batch_of(2)).await.unwrap();
		queued.shutdown().await.unwrap();

		assert_eq!(spy.events().await.len(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn wait_until_empty_times_out() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(config(10, FailedBatchPolicy::Discard), spy);

		queued.handle(batch_of(1)).await.unwrap();
		let emptied = queued
			.wait_until_empty(Duration::from_millis(10), Duration::from_millis(50))
			.await;

		assert!(!emptied);
		assert_eq!(queued.queue_len().await, 1);
	}

	#[test]
	fn usability_follows_inner() {
		let spy = Arc::new(SpyTransport::new());
		let queued = QueuedTransport::new(QueueConfig::default(), spy.clone());
		assert!(queued.is_usable());
		spy.set_usable(false);
		assert!(!queued.is_usable());
		assert!(queued.as_queued().is_some());
	}
}
