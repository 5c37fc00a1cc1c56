// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use objectiv_tracker_core::{
	context_types, make_path_context, Contexts, Event, GlobalContextRule, ValidationReport,
	ValidationRule,
};

use super::TrackerPlugin;
use crate::error::Result;

const NAME: &str = "PathContextPlugin";

/// Yields the current path of the host application, if it has one.
pub type PathProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Adds a `PathContext` with the current path to every event.
#[derive(Clone)]
pub struct PathContextPlugin {
	provider: PathProvider,
}

impl PathContextPlugin {
	pub fn new(provider: impl Fn() -> Option<String> + Send + Sync + 'static) -> Self {
		Self {
			provider: Arc::new(provider),
		}
	}

	/// A provider that always reports the same path.
	pub fn fixed(path: impl Into<String>) -> Self {
		let path = path.into();
		Self::new(move || Some(path.clone()))
	}
}

impl fmt::Debug for PathContextPlugin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PathContextPlugin").finish_non_exhaustive()
	}
}

#[async_trait]
impl TrackerPlugin for PathContextPlugin {
	fn name(&self) -> &str {
		NAME
	}

	fn is_usable(&self) -> bool {
		(self.provider)().is_some()
	}

	fn enrich(&self, contexts: &mut Contexts) -> Result<()> {
		if let Some(path) = (self.provider)() {
			contexts.push_global(make_path_context(path));
		}
		Ok(())
	}

	fn validate(&self, event: &Event) -> ValidationReport {
		GlobalContextRule::new(context_types::PATH)
			.once()
			.validate(event, Some(NAME))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	#[test]
	fn adds_current_path() {
		let current = Arc::new(Mutex::new("/home".to_string()));
		let reader = current.clone();
		let plugin = PathContextPlugin::new(move || Some(reader.lock().unwrap().clone()));

		let mut first = Contexts::new();
		plugin.enrich(&mut first).unwrap();
		assert_eq!(first.find_global(context_types::PATH).unwrap().id, "/home");

		*current.lock().unwrap() = "/settings".to_string();
		let mut second = Contexts::new();
		plugin.enrich(&mut second).unwrap();
		assert_eq!(second.find_global(context_types::PATH).unwrap().id, "/settings");
	}

	#[test]
	fn unusable_without_path() {
		let plugin = PathContextPlugin::new(|| None);
		assert!(!plugin.is_usable());
		assert!(PathContextPlugin::fixed("/").is_usable());
	}

	#[test]
	fn reports_duplicated_path_contexts() {
		let event = Event::new("PressEvent").with_global_contexts(vec![
			make_path_context("/a"),
			make_path_context("/b"),
		]);
		let report = PathContextPlugin::fixed("/").validate(&event);
		assert_eq!(report.failures().len(), 1);
		assert!(report.failures()[0].message.contains("Only one PathContext"));
	}
}
