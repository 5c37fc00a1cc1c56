// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use objectiv_tracker_core::{
	context_types, make_http_context, Context, Contexts, Event, GlobalContextRule,
	HttpContextParams, ValidationReport, ValidationRule,
};

use super::TrackerPlugin;
use crate::error::Result;

const NAME: &str = "HttpContextPlugin";

/// Adds an `HttpContext` describing the client to every event.
///
/// Only usable once a user agent is configured.
#[derive(Debug, Clone, Default)]
pub struct HttpContextPlugin {
	user_agent: Option<String>,
	referrer: Option<String>,
	remote_address: Option<String>,
}

impl HttpContextPlugin {
	pub fn new(user_agent: impl Into<String>) -> Self {
		Self {
			user_agent: Some(user_agent.into()),
			..Self::default()
		}
	}

	/// Uses the SDK's own user agent string.
	pub fn with_sdk_user_agent() -> Self {
		Self::new(objectiv_common_http::user_agent())
	}

	pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
		self.referrer = Some(referrer.into());
		self
	}

	pub fn remote_address(mut self, remote_address: impl Into<String>) -> Self {
		self.remote_address = Some(remote_address.into());
		self
	}

	fn context(&self) -> Option<Context> {
		let user_agent = self.user_agent.clone()?;
		Some(make_http_context(HttpContextParams {
			id: None,
			referrer: self.referrer.clone(),
			user_agent,
			remote_address: self.remote_address.clone(),
		}))
	}
}

#[async_trait]
impl TrackerPlugin for HttpContextPlugin {
	fn name(&self) -> &str {
		NAME
	}

	fn is_usable(&self) -> bool {
		self.user_agent.is_some()
	}

	fn enrich(&self, contexts: &mut Contexts) -> Result<()> {
		if let Some(ctx) = self.context() {
			contexts.push_global(ctx);
		}
		Ok(())
	}

	fn validate(&self, event: &Event) -> ValidationReport {
		GlobalContextRule::new(context_types::HTTP)
			.once()
			.validate(event, Some(NAME))
	}
}
