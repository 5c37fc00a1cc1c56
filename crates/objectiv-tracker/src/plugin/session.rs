// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use objectiv_tracker_core::{
	context_types, make_session_context, Contexts, Event, GlobalContextRule, ValidationReport,
	ValidationRule,
};

use super::{TrackerInfo, TrackerPlugin};
use crate::error::{Result, TrackerError};
use crate::session::SessionIdStore;

const NAME: &str = "SessionContextPlugin";

/// Adds a `SessionContext` to every event.
///
/// The session id is resolved from the store when the tracker starts. Each
/// enriched event bumps the context's `hit_number`.
pub struct SessionContextPlugin {
	store: Arc<dyn SessionIdStore>,
	session_id: OnceLock<String>,
	hits: AtomicU64,
}

impl SessionContextPlugin {
	pub fn new(store: Arc<dyn SessionIdStore>) -> Self {
		Self {
			store,
			session_id: OnceLock::new(),
			hits: AtomicU64::new(0),
		}
	}

	pub fn session_id(&self) -> Option<&str> {
		self.session_id.get().map(String::as_str)
	}
}

impl std::fmt::Debug for SessionContextPlugin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionContextPlugin")
			.field("session_id", &self.session_id.get())
			.field("hits", &self.hits.load(Ordering::Relaxed))
			.finish()
	}
}

#[async_trait]
impl TrackerPlugin for SessionContextPlugin {
	fn name(&self) -> &str {
		NAME
	}

	async fn initialize(&self, _tracker: &TrackerInfo) -> Result<()> {
		if self.session_id.get().is_some() {
			return Ok(());
		}
		let id = self.store.get_or_create_session_id().await?;
		let _ = self.session_id.set(id);
		Ok(())
	}

	fn enrich(&self, contexts: &mut Contexts) -> Result<()> {
		let id = self.session_id.get().ok_or_else(|| TrackerError::Plugin {
			plugin: NAME.to_string(),
			message: "no session id; the tracker was not started".to_string(),
		})?;
		let hit_number = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
		contexts.push_global(make_session_context(id.clone(), hit_number));
		Ok(())
	}

	fn validate(&self, event: &Event) -> ValidationReport {
		GlobalContextRule::new(context_types::SESSION)
			.once()
			.validate(event, Some(NAME))
	}
}
