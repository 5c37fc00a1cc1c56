// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The event buffer behind [`QueuedTransport`](crate::QueuedTransport).

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use objectiv_tracker_core::Event;
use tokio::sync::Mutex;
use tracing::warn;

/// What happens to a batch the inner transport failed to deliver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailedBatchPolicy {
	/// Drop the batch. Retrying is left to the transport chain.
	#[default]
	Discard,
	/// Put the events back at the head of the queue, in their original order.
	Requeue,
}

/// Configuration for the event queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
	/// Maximum number of events handed to the transport at once. Reaching
	/// this many buffered events also triggers a flush.
	pub batch_size: usize,
	/// Interval between automatic flushes.
	pub flush_interval: Duration,
	/// Maximum number of events to buffer before dropping the oldest.
	pub max_queue_size: usize,
	pub failed_batch_policy: FailedBatchPolicy,
}

impl Default for QueueConfig {
	fn default() -> Self {
		Self {
			batch_size: 10,
			flush_interval: Duration::from_secs(1),
			max_queue_size: 1000,
			failed_batch_policy: FailedBatchPolicy::Discard,
		}
	}
}

/// An event waiting to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
	pub event: Event,
	pub enqueued_at: DateTime<Utc>,
}

impl QueuedEvent {
	pub fn new(event: Event) -> Self {
		Self {
			event,
			enqueued_at: Utc::now(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
	Empty,
	Buffering,
	/// A flush has batches in flight.
	Draining,
}

#[derive(Debug, Default)]
struct QueueInner {
	events: VecDeque<QueuedEvent>,
	draining: bool,
}

impl QueueInner {
	fn state(&self) -> QueueState {
		if self.draining {
			QueueState::Draining
		} else if self.events.is_empty() {
			QueueState::Empty
		} else {
			QueueState::Buffering
		}
	}

	fn drop_overflow(&mut self, max_size: usize) {
		while self.events.len() > max_size {
			if let Some(dropped) = self.events.pop_front() {
				warn!(
					event_id = %dropped.event.id(),
					event_type = dropped.event.event_type(),
					"Dropped event due to queue overflow"
				);
			}
		}
	}
}

/// FIFO buffer of events. Every operation is a single critical section.
#[derive(Debug)]
pub struct TrackerQueue {
	max_size: usize,
	inner: Mutex<QueueInner>,
}

impl TrackerQueue {
	pub fn new(max_size: usize) -> Self {
		Self {
			max_size: max_size.max(1),
			inner: Mutex::new(QueueInner::default()),
		}
	}

	/// Appends an event and returns its 1-based position in the queue.
	///
	/// A full queue drops its oldest event first.
	pub async fn enqueue(&self, event: Event) -> usize {
		let mut inner = self.inner.lock().await;
		inner.events.push_back(QueuedEvent::new(event));
		inner.drop_overflow(self.max_size);
		inner.events.len()
	}

	/// Removes and returns up to `batch_size` of the oldest events.
	pub async fn dequeue(&self, batch_size: usize) -> Vec<QueuedEvent> {
		let mut inner = self.inner.lock().await;
		let n = batch_size.min(inner.events.len());
		inner.events.drain(..n).collect()
	}

	/// Puts events back at the head, keeping their order.
	pub(crate) async fn requeue_front(&self, events: Vec<QueuedEvent>) {
		let mut inner = self.inner.lock().await;
		for event in events.into_iter().rev() {
			inner.events.push_front(event);
		}
		inner.drop_overflow(self.max_size);
	}

	pub(crate) async fn set_draining(&self, draining: bool) {
		self.inner.lock().await.draining = draining;
	}

	pub async fn len(&self) -> usize {
		self.inner.lock().await.events.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.inner.lock().await.events.is_empty()
	}

	pub async fn state(&self) -> QueueState {
		self.inner.lock().await.state()
	}

	pub fn max_size(&self) -> usize {
		self.max_size
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use objectiv_tracker_core::EventId;
	use proptest::prelude::*;

	fn event(n: usize) -> Event {
		Event::new(format!("Event{n}"))
	}

	#[tokio::test]
	async fn enqueue_returns_position() {
		let queue = TrackerQueue::new(100);
		assert_eq!(queue.enqueue(event(0)).await, 1);
		assert_eq!(queue.enqueue(event(1)).await, 2);
		assert_eq!(queue.len().await, 2);
	}

	#[tokio::test]
	async fn dequeue_fewer_than_batch_size_empties_queue() {
		let queue = TrackerQueue::new(100);
		for i in 0..3 {
			queue.enqueue(event(i)).await;
		}

		let batch = queue.dequeue(10).await;

		assert_eq!(batch.len(), 3);
		assert!(queue.is_empty().await);
		assert_eq!(queue.state().await, QueueState::Empty);
	}

	#[tokio::test]
	async fn dequeue_empty_queue_returns_nothing() {
		let queue = TrackerQueue::new(100);
		assert!(queue.dequeue(10).await.is_empty());
		assert!(queue.dequeue(0).await.is_empty());
	}

	#[tokio::test]
	async fn dequeue_exactly_batch_size() {
		let queue = TrackerQueue::new(100);
		for i in 0..5 {
			queue.enqueue(event(i)).await;
		}

		assert_eq!(queue.dequeue(5).await.len(), 5);
		assert!(queue.is_empty().await);
	}

	#[tokio::test]
	async fn state_transitions() {
		let queue = TrackerQueue::new(100);
		assert_eq!(queue.state().await, QueueState::Empty);

		queue.enqueue(event(0)).await;
		assert_eq!(queue.state().await, QueueState::Buffering);

		queue.set_draining(true).await;
		assert_eq!(queue.state().await, QueueState::Draining);

		queue.dequeue(1).await;
		queue.set_draining(false).await;
		assert_eq!(queue.state().await, QueueState::Empty);
	}

	#[tokio::test]
	async fn overflow_drops_oldest() {
		let queue = TrackerQueue::new(3);
		for i in 0..5 {
			assert!(queue.enqueue(event(i)).await <= 3);
		}

		let types: Vec<String> = queue
			.dequeue(10)
			.await
			.into_iter()
			.map(|q| q.event.event_type().to_string())
			.collect();
		assert_eq!(types, vec!["Event2", "Event3", "Event4"]);
	}

	#[tokio::test]
	async fn requeue_front_keeps_order() {
		let queue = TrackerQueue::new(100);
		for i in 0..4 {
			queue.enqueue(event(i)).await;
		}
		let first = queue.dequeue(2).await;
		queue.requeue_front(first).await;

		let types: Vec<String> = queue
			.dequeue(10)
			.await
			.into_iter()
			.map(|q| q.event.event_type().to_string())
			.collect();
		assert_eq!(types, vec!["Event0", "Event1", "Event2", "Event3"]);
	}

	#[test]
	fn config_defaults() {
		let config = QueueConfig::default();
		assert_eq!(config.batch_size, 10);
		assert_eq!(config.flush_interval, Duration::from_secs(1));
		assert_eq!(config.max_queue_size, 1000);
		assert_eq!(config.failed_batch_policy, FailedBatchPolicy::Discard);
	}

	proptest! {
		#[test]
		fn dequeue_preserves_fifo_order(
			count in 0..200usize,
			batch_sizes in proptest::collection::vec(1..20usize, 1..50),
		) {
			tokio_test::block_on(async {
				let queue = TrackerQueue::new(1000);
				let mut expected: Vec<EventId> = Vec::new();
				for i in 0..count {
					let e = event(i);
					expected.push(e.id());
					queue.enqueue(e).await;
				}

				let mut seen = Vec::new();
				for k in batch_sizes.iter().cycle().take(count + batch_sizes.len()) {
					let batch = queue.dequeue(*k).await;
					assert!(batch.len() <= *k);
					seen.extend(batch.into_iter().map(|q| q.event.id()));
				}

				assert_eq!(seen, expected);
				assert!(queue.is_empty().await);
			});
		}

		#[test]
		fn length_never_exceeds_max(max in 1..50usize, count in 0..200usize) {
			tokio_test::block_on(async {
				let queue = TrackerQueue::new(max);
				for i in 0..count {
					let position = queue.enqueue(event(i)).await;
					assert!(position <= max);
				}
				assert_eq!(queue.len().await, count.min(max));
			});
		}
	}
}
