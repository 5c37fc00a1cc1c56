// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_tracker_core::{
	context_types, make_root_location_context, Contexts, Event, LocationContextRule,
	ValidationReport, ValidationRule,
};

use super::TrackerPlugin;
use crate::error::Result;

const NAME: &str = "RootLocationContextPlugin";

/// Makes sure every location stack starts with a `RootLocationContext`.
#[derive(Debug, Clone)]
pub struct RootLocationContextPlugin {
	id: String,
}

impl RootLocationContextPlugin {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into() }
	}
}

impl Default for RootLocationContextPlugin {
	fn default() -> Self {
		Self::new("home")
	}
}

#[async_trait]
impl TrackerPlugin for RootLocationContextPlugin {
	fn name(&self) -> &str {
		NAME
	}

	fn enrich(&self, contexts: &mut Contexts) -> Result<()> {
		if contexts.count_location(context_types::ROOT_LOCATION) == 0 {
			contexts.prepend_location(make_root_location_context(self.id.clone()));
		}
		Ok(())
	}

	fn validate(&self, event: &Event) -> ValidationReport {
		LocationContextRule::new(context_types::ROOT_LOCATION)
			.once()
			.at_position(0)
			.validate(event, Some(NAME))
	}
}
