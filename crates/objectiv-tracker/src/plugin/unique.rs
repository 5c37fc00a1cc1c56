// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_tracker_core::{Event, UniqueGlobalContextRule, ValidationReport, ValidationRule};

use super::TrackerPlugin;

const NAME: &str = "UniqueGlobalContextPlugin";

/// Validation only: flags global contexts sharing a type and id.
#[derive(Debug, Clone, Default)]
pub struct UniqueGlobalContextPlugin;

impl UniqueGlobalContextPlugin {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl TrackerPlugin for UniqueGlobalContextPlugin {
	fn name(&self) -> &str {
		NAME
	}

	fn validate(&self, event: &Event) -> ValidationReport {
		UniqueGlobalContextRule.validate(event, Some(NAME))
	}
}
