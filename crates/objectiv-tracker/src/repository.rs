// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trackers by id, with a default tracker for convenience APIs.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::tracker::Tracker;

static TRACKERS: OnceLock<TrackerRepository> = OnceLock::new();

/// The process-wide repository. Tests reset it with
/// [`TrackerRepository::clear`].
pub fn trackers() -> &'static TrackerRepository {
	TRACKERS.get_or_init(TrackerRepository::new)
}

#[derive(Debug, Default)]
struct Entries {
	trackers: HashMap<String, Tracker>,
	default_id: Option<String>,
}

/// Holds trackers by tracker id. The first tracker added becomes the
/// default.
#[derive(Debug, Default)]
pub struct TrackerRepository {
	entries: RwLock<Entries>,
}

impl TrackerRepository {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a tracker, replacing any tracker with the same id.
	pub fn add(&self, tracker: Tracker) -> Result<()> {
		let mut entries = self.entries.write().map_err(|_| TrackerError::LockPoisoned)?;
		let id = tracker.tracker_id().to_string();
		if entries.trackers.insert(id.clone(), tracker).is_some() {
			warn!(tracker_id = %id, "Replaced existing tracker");
		}
		if entries.default_id.is_none() {
			debug!(tracker_id = %id, "Default tracker set");
			entries.default_id = Some(id);
		}
		Ok(())
	}

	pub fn get(&self, tracker_id: &str) -> Result<Option<Tracker>> {
		let entries = self.entries.read().map_err(|_| TrackerError::LockPoisoned)?;
		Ok(entries.trackers.get(tracker_id).cloned())
	}

	pub fn get_default(&self) -> Result<Option<Tracker>> {
		let entries = self.entries.read().map_err(|_| TrackerError::LockPoisoned)?;
		Ok(entries
			.default_id
			.as_ref()
			.and_then(|id| entries.trackers.get(id))
			.cloned())
	}

	/// Returns false when no tracker has that id.
	pub fn set_default(&self, tracker_id: &str) -> Result<bool> {
		let mut entries = self.entries.write().map_err(|_| TrackerError::LockPoisoned)?;
		if !entries.trackers.contains_key(tracker_id) {
			return Ok(false);
		}
		entries.default_id = Some(tracker_id.to_string());
		Ok(true)
	}

	/// Removes a tracker. Removing the default makes the remaining tracker
	/// with the smallest id the new default.
	pub fn remove(&self, tracker_id: &str) -> Result<Option<Tracker>> {
		let mut entries = self.entries.write().map_err(|_| TrackerError::LockPoisoned)?;
		let removed = entries.trackers.remove(tracker_id);
		if entries.default_id.as_deref() == Some(tracker_id) {
			entries.default_id = entries.trackers.keys().min().cloned();
		}
		Ok(removed)
	}

	pub fn len(&self) -> Result<usize> {
		let entries = self.entries.read().map_err(|_| TrackerError::LockPoisoned)?;
		Ok(entries.trackers.len())
	}

	pub fn is_empty(&self) -> Result<bool> {
		Ok(self.len()? == 0)
	}

	pub fn clear(&self) -> Result<()> {
		let mut entries = self.entries.write().map_err(|_| TrackerError::LockPoisoned)?;
		entries.trackers.clear();
		entries.default_id = None;
		Ok(())
	}

	pub fn activate_all(&self) -> Result<()> {
		self.set_all_active(true)
	}

	pub fn deactivate_all(&self) -> Result<()> {
		self.set_all_active(false)
	}

	fn set_all_active(&self, active: bool) -> Result<()> {
		let entries = self.entries.read().map_err(|_| TrackerError::LockPoisoned)?;
		for tracker in entries.trackers.values() {
			tracker.set_active(active);
		}
		Ok(())
	}
}
