// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use objectiv_tracker_core::{Event, EventBatch};
use tokio::sync::Mutex;

use super::TrackerTransport;
use crate::error::{Result, TrackerError};

/// Records every batch it handles.
///
/// Usability and failure can be toggled at runtime, which makes it useful
/// for exercising transport combinators and for hosts that want to inspect
/// what would have been sent.
#[derive(Debug)]
pub struct SpyTransport {
	name: String,
	usable: AtomicBool,
	failing: AtomicBool,
	batches: Mutex<Vec<EventBatch>>,
}

impl SpyTransport {
	pub fn new() -> Self {
		Self::named("SpyTransport")
	}

	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			usable: AtomicBool::new(true),
			failing: AtomicBool::new(false),
			batches: Mutex::new(Vec::new()),
		}
	}

	pub fn set_usable(&self, usable: bool) {
		self.usable.store(usable, Ordering::SeqCst);
	}

	/// When set, `handle` records nothing and fails with a network error.
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub async fn batches(&self) -> Vec<EventBatch> {
		self.batches.lock().await.clone()
	}

	/// Every handled event, in handling order.
	pub async fn events(&self) -> Vec<Event> {
		self.batches
			.lock()
			.await
			.iter()
			.flat_map(|b| b.iter().cloned())
			.collect()
	}

	pub async fn batch_count(&self) -> usize {
		self.batches.lock().await.len()
	}

	pub async fn clear(&self) {
		self.batches.lock().await.clear();
	}
}

impl Default for SpyTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl TrackerTransport for SpyTransport {
	fn transport_name(&self) -> &str {
		&self.name
	}

	fn is_usable(&self) -> bool {
		self.usable.load(Ordering::SeqCst)
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(TrackerError::network(&self.name, "spy configured to fail"));
		}
		self.batches.lock().await.push(batch);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use objectiv_tracker_core::make_press_event;

	#[tokio::test]
	async fn records_batches() {
		let spy = SpyTransport::new();
		let event = make_press_event(vec![], vec![]);
		spy.handle(EventBatch::single(event.clone())).await.unwrap();

		assert_eq!(spy.batch_count().await, 1);
		assert_eq!(spy.events().await, vec![event]);
	}

	#[tokio::test]
	async fn failing_spy_records_nothing() {
		let spy = SpyTransport::named("broken");
		spy.set_failing(true);

		let result = spy
			.handle(EventBatch::single(make_press_event(vec![], vec![])))
			.await;

		assert!(result.unwrap_err().is_send_failure());
		assert_eq!(spy.batch_count().await, 0);
	}

	#[test]
	fn usability_toggles() {
		let spy = SpyTransport::new();
		assert!(spy.is_usable());
		spy.set_usable(false);
		assert!(!spy.is_usable());
	}
}
