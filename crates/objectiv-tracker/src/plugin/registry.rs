// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered plugin collection driving lifecycle dispatch.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::FutureExt;
use objectiv_tracker_core::{Contexts, Event, ValidationReport};
use tracing::{debug, error, warn};

use super::{SharedPlugin, TrackerInfo};
use crate::error::{Result, TrackerError};

/// Plugins in registration order.
///
/// Every dispatch skips unusable plugins and isolates failures: an error or
/// a panic inside one plugin is logged and the remaining plugins still run.
#[derive(Clone, Default)]
pub struct PluginRegistry {
	plugins: Vec<SharedPlugin>,
}

impl PluginRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a registry from plugins in order, rejecting duplicate names.
	pub fn with_plugins(plugins: impl IntoIterator<Item = SharedPlugin>) -> Result<Self> {
		let mut registry = Self::new();
		for plugin in plugins {
			registry.add(plugin)?;
		}
		Ok(registry)
	}

	/// Appends a plugin.
	pub fn add(&mut self, plugin: SharedPlugin) -> Result<()> {
		if self.has(plugin.name()) {
			return Err(TrackerError::DuplicatePlugin(plugin.name().to_string()));
		}
		debug!(plugin = plugin.name(), "Registered plugin");
		self.plugins.push(plugin);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<SharedPlugin> {
		self.plugins.iter().find(|p| p.name() == name).cloned()
	}

	pub fn has(&self, name: &str) -> bool {
		self.plugins.iter().any(|p| p.name() == name)
	}

	pub fn len(&self) -> usize {
		self.plugins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.plugins.is_empty()
	}

	pub fn names(&self) -> Vec<&str> {
		self.plugins.iter().map(|p| p.name()).collect()
	}

	fn usable(&self) -> impl Iterator<Item = &SharedPlugin> {
		self.plugins.iter().filter(|p| p.is_usable())
	}

	/// Initializes every usable plugin, in order.
	pub async fn initialize_all(&self, tracker: &TrackerInfo) {
		for plugin in self.usable() {
			match AssertUnwindSafe(plugin.initialize(tracker))
				.catch_unwind()
				.await
			{
				Ok(Ok(())) => debug!(plugin = plugin.name(), "Initialized plugin"),
				Ok(Err(e)) => {
					error!(plugin = plugin.name(), error = %e, "Plugin failed to initialize")
				}
				Err(panic) => error!(
					plugin = plugin.name(),
					panic = %panic_message(&*panic),
					"Plugin panicked during initialize"
				),
			}
		}
	}

	/// Runs `enrich` of every usable plugin over the event's contexts.
	pub fn enrich_all(&self, contexts: &mut Contexts) {
		for plugin in self.usable() {
			match catch_unwind(AssertUnwindSafe(|| plugin.enrich(contexts))) {
				Ok(Ok(())) => {}
				Ok(Err(e)) => error!(plugin = plugin.name(), error = %e, "Plugin failed to enrich event"),
				Err(panic) => error!(
					plugin = plugin.name(),
					panic = %panic_message(&*panic),
					"Plugin panicked during enrich"
				),
			}
		}
	}

	/// Runs `validate` of every usable plugin and logs each failure.
	///
	/// The merged report is returned for inspection; it never blocks delivery.
	pub fn validate_all(&self, event: &Event) -> ValidationReport {
		let mut report = ValidationReport::new();
		for plugin in self.usable() {
			match catch_unwind(AssertUnwindSafe(|| plugin.validate(event))) {
				Ok(plugin_report) => report.merge(plugin_report),
				Err(panic) => error!(
					plugin = plugin.name(),
					panic = %panic_message(&*panic),
					"Plugin panicked during validate"
				),
			}
		}

		for failure in report.failures() {
			warn!(
				event_id = %event.id(),
				event_type = event.event_type(),
				rule = %failure.rule,
				"{}",
				failure.message
			);
		}

		report
	}
}

impl std::fmt::Debug for PluginRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PluginRegistry")
			.field("plugins", &self.names())
			.finish()
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_string()
	}
}
