// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use futures::future::join_all;
use objectiv_tracker_core::EventBatch;
use tracing::warn;

use super::{SharedTransport, TrackerTransport};
use crate::error::{Result, TrackerError};

/// Sends every batch to all usable members concurrently.
///
/// Succeeds when at least one member delivered; otherwise returns the first
/// member's error.
pub struct TransportGroup {
	members: Vec<SharedTransport>,
}

impl TransportGroup {
	pub fn new(members: Vec<SharedTransport>) -> Self {
		Self { members }
	}

	pub fn members(&self) -> &[SharedTransport] {
		&self.members
	}
}

impl std::fmt::Debug for TransportGroup {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let names: Vec<&str> = self.members.iter().map(|t| t.transport_name()).collect();
		f.debug_struct("TransportGroup")
			.field("members", &names)
			.finish()
	}
}

#[async_trait]
impl TrackerTransport for TransportGroup {
	fn transport_name(&self) -> &str {
		"TransportGroup"
	}

	fn is_usable(&self) -> bool {
		self.members.iter().any(|t| t.is_usable())
	}

	async fn handle(&self, batch: EventBatch) -> Result<()> {
		let usable: Vec<&SharedTransport> =
			self.members.iter().filter(|t| t.is_usable()).collect();
		if usable.is_empty() {
			return Err(TrackerError::NoUsableTransport);
		}

		let results = join_all(usable.iter().map(|t| t.handle(batch.clone()))).await;

		let mut first_error = None;
		let mut delivered = false;
		for (transport, result) in usable.iter().zip(results) {
			match result {
				Ok(()) => delivered = true,
				Err(e) => {
					warn!(transport = transport.transport_name(), error = %e, "Group member failed");
					first_error.get_or_insert(e);
				}
			}
		}

		match first_error {
			Some(e) if !delivered => Err(e),
			_ => Ok(()),
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

	#[tokio::test]
	async fn fans_out_to_usable_members() {
		let a = Arc::new(SpyTransport::named("a"));
		let b = Arc::new(SpyTransport::named("b"));
		let c = Arc::new(SpyTransport::named("c"));
		c.set_usable(false);
		let group = TransportGroup::new(vec![a.clone(), b.clone(), c.clone()]);

		let batch = batch();
		group.handle(batch.clone()).await.unwrap();

		assert_eq!(a.batches().await, vec![batch.clone()]);
		assert_eq!(b.batches().await, vec![batch]);
		assert_eq!(c.batch_count().await, 0);
	}

	#[tokio::test]
	async fn one_success_is_enough() {
		let a = Arc::new(SpyTransport::named("a"));
		let b = Arc::new(SpyTransport::named("b"));
		a.set_failing(true);
		let group = TransportGroup::new(vec![a, b.clone()]);

		group.handle(batch()).await.unwrap();
		assert_eq!(b.batch_count().await, 1);
	}

	#[tokio::test]
	async fn all_failures_return_first_error() {
		let a = Arc::new(SpyTransport::named("a"));
		let b = Arc::new(SpyTransport::named("b"));
		a.set_failing(true);
		b.set_failing(true);
		let group = TransportGroup::new(vec![a, b]);

		match group.handle(batch()).await {
			Err(TrackerError::SendFailed { transport, .. }) => assert_eq!(transport, "a"),
			other => panic!("expected SendFailed, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn usable_if_any_member_is() {
		let a = Arc::new(SpyTransport::named("a"));
		let b = Arc::new(SpyTransport::named("b"));
		a.set_usable(false);
		let group = TransportGroup::new(vec![a.clone(), b.clone()]);
		assert!(group.is_usable());

		b.set_usable(false);
		assert!(!group.is_usable());
		assert!(matches!(
			group.handle(batch()).await,
			Err(TrackerError::NoUsableTransport)
		));
	}
}
