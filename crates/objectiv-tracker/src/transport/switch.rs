// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_tracker_core::EventBatch;
use tracing::{debug, warn};

use super::{SharedTransport, TrackerTransport};
use crate::error::{Result, TrackerError};

/// Uses the first candidate that is usable when the switch is built.
///
/// The choice is made once; later changes in the candidates' usability do
/// not move the switch to another transport.
pub struct TransportSwitch {
	selected: Option<SharedTransport>,
}

impl TransportSwitch {
	pub fn new(candidates: Vec<SharedTransport>) -> Self {
		let selected = candidates.into_iter().find(|t| t.is_usable());
		match &selected {
			Some(t) => debug!(transport = t.transport_name(), "Transport switch selected"),
			None => warn!("Transport switch found no usable transport"),
		}
		Self { selected }
	}

	pub fn first_usable_transport(&self) -> Option<&SharedTransport> {
		self.selected.as_ref()
	}
}

impl std::fmt::Debug for TransportSwitch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransportSwitch")
			.field("selected", &self.selected.as_ref().map(|t| t.transport_name()))
			.finish()
	}
}

#[async_trait]
impl TrackerTransport for TransportSwitch {
	fn transport_name(&self) -> &str {
		"TransportSwitch"
	}

	fn is_usable(&self) -> bool {
		self.selected.is_some()
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		match &self.selected {
			Some(transport) => transport.handle(batch).await,
			None => Err(TrackerError::NoUsableTransport),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::SpyTransport;
	use objectiv_tracker_core::make_press_event;
	use std::sync::Arc;

	fn batch() -> EventBatch {
		EventBatch::single(make_press_event(vec![], vec![]))
	}

	fn spy(name: &str, usable: bool) -> Arc<SpyTransport> {
		let spy = Arc::new(SpyTransport::named(name));
		spy.set_usable(usable);
		spy
	}

	#[tokio::test]
	async fn picks_first_usable_and_only_calls_it() {
		let a = spy("a", false);
		let b = spy("b", true);
		let c = spy("c", true);
		let switch = TransportSwitch::new(vec![a.clone(), b.clone(), c.clone()]);

		assert!(switch.is_usable());
		assert_eq!(
			switch.first_usable_transport().unwrap().transport_name(),
			"b"
		);

		switch.handle(batch()).await.unwrap();

		assert_eq!(a.batch_count().await, 0);
		assert_eq!(b.batch_count().await, 1);
		assert_eq!(c.batch_count().await, 0);
	}

	#[tokio::test]
	async fn propagates_selected_error() {
		let a = spy("a", true);
		let b = spy("b", true);
		a.set_failing(true);
		let switch = TransportSwitch::new(vec![a, b.clone()]);

		let err = switch.handle(batch()).await.unwrap_err();
		assert!(err.is_send_failure());
		assert_eq!(b.batch_count().await, 0);
	}

	#[tokio::test]
	async fn selection_is_fixed_at_construction() {
		let a = spy("a", false);
		let b = spy("b", true);
		let switch = TransportSwitch::new(vec![a.clone(), b.clone()]);

		a.set_usable(true);
		switch.handle(batch()).await.unwrap();

		assert_eq!(a.batch_count().await, 0);
		assert_eq!(b.batch_count().await, 1);
	}

	#[tokio::test]
	async fn no_usable_candidate() {
		let switch = TransportSwitch::new(vec![spy("a", false)]);
		assert!(!switch.is_usable());
		assert!(switch.first_usable_transport().is_none());
		assert!(matches!(
			switch.handle(batch()).await,
			Err(TrackerError::NoUsableTransport)
		));
	}
}
