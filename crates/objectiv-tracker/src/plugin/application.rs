// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::OnceLock;

use async_trait::async_trait;
use objectiv_tracker_core::{
	context_types, make_application_context, Context, Contexts, Event, GlobalContextRule,
	ValidationReport, ValidationRule,
};

use super::{TrackerInfo, TrackerPlugin};
use crate::error::{Result, TrackerError};

/// Adds an `ApplicationContext` carrying the application id to every event.
///
/// The id is taken from the tracker on first initialization unless one was
/// given up front.
#[derive(Debug, Default)]
pub struct ApplicationContextPlugin {
	context: OnceLock<Context>,
}

impl ApplicationContextPlugin {
	pub const NAME: &'static str = "ApplicationContextPlugin";

	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_application_id(application_id: impl Into<String>) -> Self {
		let plugin = Self::new();
		let _ = plugin.context.set(make_application_context(application_id));
		plugin
	}

	pub fn application_id(&self) -> Option<&str> {
		self.context.get().map(|ctx| ctx.id.as_str())
	}
}

#[async_trait]
impl TrackerPlugin for ApplicationContextPlugin {
	fn name(&self) -> &str {
		Self::NAME
	}

	async fn initialize(&self, tracker: &TrackerInfo) -> Result<()> {
		if self.context.get().is_some() {
			return Ok(());
		}
		let application_id = tracker
			.application_id
			.as_deref()
			.ok_or_else(|| TrackerError::Plugin {
				plugin: Self::NAME.to_string(),
				message: "tracker has no application id".to_string(),
			})?;
		self.context
			.get_or_init(|| make_application_context(application_id));
		Ok(())
	}

	fn enrich(&self, contexts: &mut Contexts) -> Result<()> {
		let ctx = self.context.get().ok_or_else(|| TrackerError::Plugin {
			plugin: Self::NAME.to_string(),
			message: "not initialized".to_string(),
		})?;
		contexts.push_global(ctx.clone());
		Ok(())
	}

	fn validate(&self, event: &Event) -> ValidationReport {
		GlobalContextRule::new(context_types::APPLICATION)
			.once()
			.validate(event, Some(Self::NAME))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn takes_application_id_from_tracker() {
		let plugin = ApplicationContextPlugin::new();
		plugin
			.initialize(&TrackerInfo::new("tracker").with_application_id("my-app"))
			.await
			.unwrap();

		let mut contexts = Contexts::new();
		plugin.enrich(&mut contexts).unwrap();

		let ctx = contexts.find_global(context_types::APPLICATION).unwrap();
		assert_eq!(ctx.id, "my-app");
	}

	#[tokio::test]
	async fn initialize_is_idempotent() {
		let plugin = ApplicationContextPlugin::new();
		plugin
			.initialize(&TrackerInfo::new("tracker").with_application_id("first"))
			.await
			.unwrap();
		plugin
			.initialize(&TrackerInfo::new("tracker").with_application_id("second"))
			.await
			.unwrap();

		assert_eq!(plugin.application_id(), Some("first"));
	}

	#[tokio::test]
	async fn initialize_without_application_id_fails() {
		let plugin = ApplicationContextPlugin::new();
		let result = plugin.initialize(&TrackerInfo::new("tracker")).await;

		assert!(matches!(result, Err(TrackerError::Plugin { .. })));
		assert!(plugin.application_id().is_none());
	}

	#[tokio::test]
	async fn explicit_id_wins_over_tracker() {
		let plugin = ApplicationContextPlugin::with_application_id("explicit");
		plugin
			.initialize(&TrackerInfo::new("tracker").with_application_id("from-tracker"))
			.await
			.unwrap();
		assert_eq!(plugin.application_id(), Some("explicit"));
	}

	#[test]
	fn enrich_before_initialize_fails() {
		let plugin = ApplicationContextPlugin::new();
		let mut contexts = Contexts::new();
		assert!(matches!(
			plugin.enrich(&mut contexts),
			Err(TrackerError::Plugin { .. })
		));
		assert!(contexts.global_contexts().is_empty());
	}

	#[test]
	fn enrich_twice_keeps_one_context() {
		let plugin = ApplicationContextPlugin::with_application_id("app");
		let mut contexts = Contexts::new();
		plugin.enrich(&mut contexts).unwrap();
		plugin.enrich(&mut contexts).unwrap();
		assert_eq!(contexts.count_global(context_types::APPLICATION), 1);
	}

	#[test]
	fn validates_presence() {
		let plugin = ApplicationContextPlugin::with_application_id("app");
		let report = plugin.validate(&Event::new("PressEvent"));
		assert_eq!(report.failures().len(), 1);
		assert!(report.failures()[0]
			.message
			.starts_with("[objectiv:ApplicationContextPlugin]"));

		let event = Event::new("PressEvent")
			.with_global_contexts(vec![make_application_context("app")]);
		assert!(plugin.validate(&event).is_valid());
	}
}
