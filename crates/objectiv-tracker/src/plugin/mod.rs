// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracker plugins: units that enrich and validate events.
//!
//! Every lifecycle hook of [`TrackerPlugin`] is optional and defaults to a
//! no-op, so a plugin only implements the capabilities it has:
//!
//! | Hook | When | May |
//! |------|------|-----|
//! | `initialize` | once, when the tracker starts | read [`TrackerInfo`], prepare state |
//! | `enrich` | per event, before validation | append contexts |
//! | `validate` | per event, after enrichment | report problems |
//! | `is_usable` | before each hook | opt out on this platform |
//!
//! Plugins run in registration order. A plugin whose `enrich` depends on
//! another plugin's output must be registered after it.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use objectiv_tracker::{Contexts, TrackerPlugin, Result};
//! use objectiv_tracker_core::make_path_context;
//!
//! struct StaticPath;
//!
//! #[async_trait]
//! impl TrackerPlugin for StaticPath {
//!     fn name(&self) -> &str {
//!         "StaticPath"
//!     }
//!
//!     fn enrich(&self, contexts: &mut Contexts) -> Result<()> {
//!         contexts.push_global(make_path_context("/static"));
//!         Ok(())
//!     }
//! }
//! ```

mod application;
mod http;
mod path;
mod registry;
mod root_location;
mod session;
mod unique;

use std::sync::Arc;

use async_trait::async_trait;
use objectiv_tracker_core::{Contexts, Event, ValidationReport};

use crate::error::Result;

pub use application::ApplicationContextPlugin;
pub use http::HttpContextPlugin;
pub use path::{PathContextPlugin, PathProvider};
pub use registry::PluginRegistry;
pub use root_location::RootLocationContextPlugin;
pub use session::SessionContextPlugin;
pub use unique::UniqueGlobalContextPlugin;

/// Tracker-level facts handed to plugins on initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerInfo {
	pub tracker_id: String,
	pub application_id: Option<String>,
	pub platform: String,
}

impl TrackerInfo {
	pub fn new(tracker_id: impl Into<String>) -> Self {
		Self {
			tracker_id: tracker_id.into(),
			application_id: None,
			platform: default_platform(),
		}
	}

	pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
		self.application_id = Some(application_id.into());
		self
	}
}

/// The platform string reported by default, e.g. `rust/linux-x86_64`.
pub fn default_platform() -> String {
	format!("rust/{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// A pluggable unit contributing enrichment or validation.
#[async_trait]
pub trait TrackerPlugin: Send + Sync + 'static {
	/// Unique name within a registry.
	fn name(&self) -> &str;

	/// Platform gate. Unusable plugins are skipped by every hook.
	fn is_usable(&self) -> bool {
		true
	}

	/// Called when the tracker starts. Must tolerate repeated calls.
	async fn initialize(&self, _tracker: &TrackerInfo) -> Result<()> {
		Ok(())
	}

	/// Adds contexts to an event. Contexts can only be appended or prefixed.
	fn enrich(&self, _contexts: &mut Contexts) -> Result<()> {
		Ok(())
	}

	/// Read-only checks over the enriched event.
	fn validate(&self, _event: &Event) -> ValidationReport {
		ValidationReport::new()
	}
}

/// Type alias for a shared plugin.
pub type SharedPlugin = Arc<dyn TrackerPlugin>;
