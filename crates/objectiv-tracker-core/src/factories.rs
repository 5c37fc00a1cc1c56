// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Constructors for the well-known contexts and events.
//!
//! These are plain value producers; the pipeline only ever looks at the
//! resulting type and id.

use crate::context::{context_types, Context};
use crate::event::{event_types, Event};

pub fn make_root_location_context(id: impl Into<String>) -> Context {
	Context::new(context_types::ROOT_LOCATION, id)
}

pub fn make_section_context(id: impl Into<String>) -> Context {
	Context::new(context_types::SECTION, id)
}

pub fn make_navigation_context(id: impl Into<String>) -> Context {
	Context::new(context_types::NAVIGATION, id)
}

pub fn make_overlay_context(id: impl Into<String>) -> Context {
	Context::new(context_types::OVERLAY, id)
}

pub fn make_content_context(id: impl Into<String>) -> Context {
	Context::new(context_types::CONTENT, id)
}

pub fn make_expandable_context(id: impl Into<String>) -> Context {
	Context::new(context_types::EXPANDABLE, id)
}

pub fn make_input_context(id: impl Into<String>) -> Context {
	Context::new(context_types::INPUT, id)
}

/// A pressable element. `text` defaults to the id.
pub fn make_pressable_context(id: impl Into<String>, text: Option<String>) -> Context {
	let id = id.into();
	let text = text.unwrap_or_else(|| id.clone());
	Context::new(context_types::PRESSABLE, id).with_attribute("text", text)
}

/// A link. `text` defaults to the id.
pub fn make_link_context(
	id: impl Into<String>,
	href: impl Into<String>,
	text: Option<String>,
) -> Context {
	let id = id.into();
	let text = text.unwrap_or_else(|| id.clone());
	Context::new(context_types::LINK, id)
		.with_attribute("text", text)
		.with_attribute("href", href.into())
}

pub fn make_application_context(id: impl Into<String>) -> Context {
	Context::new(context_types::APPLICATION, id)
}

/// A path context; the path is also the id.
pub fn make_path_context(path: impl Into<String>) -> Context {
	Context::new(context_types::PATH, path)
}

pub fn make_session_context(id: impl Into<String>, hit_number: u64) -> Context {
	Context::new(context_types::SESSION, id).with_attribute("hit_number", hit_number)
}

pub fn make_cookie_id_context(cookie_id: impl Into<String>) -> Context {
	let cookie_id = cookie_id.into();
	Context::new(context_types::COOKIE_ID, cookie_id.clone()).with_attribute("cookie_id", cookie_id)
}

pub fn make_identity_context(id: impl Into<String>, value: impl Into<String>) -> Context {
	Context::new(context_types::IDENTITY, id).with_attribute("value", value.into())
}

pub fn make_input_value_context(id: impl Into<String>, value: impl Into<String>) -> Context {
	Context::new(context_types::INPUT_VALUE, id).with_attribute("value", value.into())
}

/// Parameters for an `HttpContext`.
#[derive(Debug, Clone, Default)]
pub struct HttpContextParams {
	pub id: Option<String>,
	pub referrer: Option<String>,
	pub user_agent: String,
	pub remote_address: Option<String>,
}

/// An `HttpContext`. The id defaults to `"http_context"` and the referrer to
/// an empty string.
pub fn make_http_context(params: HttpContextParams) -> Context {
	let mut ctx = Context::new(
		context_types::HTTP,
		params.id.unwrap_or_else(|| "http_context".to_string()),
	)
	.with_attribute("referrer", params.referrer.unwrap_or_default())
	.with_attribute("user_agent", params.user_agent);

	if let Some(remote_address) = params.remote_address {
		ctx = ctx.with_attribute("remote_address", remote_address);
	}
	ctx
}

/// Parameters for a `MarketingContext`, usually parsed from UTM parameters.
#[derive(Debug, Clone, Default)]
pub struct MarketingContextParams {
	pub id: Option<String>,
	pub source: String,
	pub medium: String,
	pub campaign: String,
	pub term: Option<String>,
	pub content: Option<String>,
}

pub fn make_marketing_context(params: MarketingContextParams) -> Context {
	let mut ctx = Context::new(
		context_types::MARKETING,
		params.id.unwrap_or_else(|| "utm".to_string()),
	)
	.with_attribute("source", params.source)
	.with_attribute("medium", params.medium)
	.with_attribute("campaign", params.campaign);

	if let Some(term) = params.term {
		ctx = ctx.with_attribute("term", term);
	}
	if let Some(content) = params.content {
		ctx = ctx.with_attribute("content", content);
	}
	ctx
}

/// Builds an event of any type from initial contexts.
pub fn make_event(
	event_type: impl Into<String>,
	location_stack: Vec<Context>,
	global_contexts: Vec<Context>,
) -> Event {
	Event::new(event_type)
		.with_location_stack(location_stack)
		.with_global_contexts(global_contexts)
}

pub fn make_press_event(location_stack: Vec<Context>, global_contexts: Vec<Context>) -> Event {
	make_event(event_types::PRESS, location_stack, global_contexts)
}

pub fn make_application_loaded_event(
	location_stack: Vec<Context>,
	global_contexts: Vec<Context>,
) -> Event {
	make_event(event_types::APPLICATION_LOADED, location_stack, global_contexts)
}

pub fn make_input_change_event(
	location_stack: Vec<Context>,
	global_contexts: Vec<Context>,
) -> Event {
	make_event(event_types::INPUT_CHANGE, location_stack, global_contexts)
}

pub fn make_visible_event(location_stack: Vec<Context>, global_contexts: Vec<Context>) -> Event {
	make_event(event_types::VISIBLE, location_stack, global_contexts)
}

pub fn make_hidden_event(location_stack: Vec<Context>, global_contexts: Vec<Context>) -> Event {
	make_event(event_types::HIDDEN, location_stack, global_contexts)
}

/// A success event. The message travels in an `OutcomeContext` global context.
pub fn make_success_event(
	message: impl Into<String>,
	location_stack: Vec<Context>,
	mut global_contexts: Vec<Context>,
) -> Event {
	global_contexts.push(outcome_context("success", message.into()));
	make_event(event_types::SUCCESS, location_stack, global_contexts)
}

pub fn make_failure_event(
	message: impl Into<String>,
	location_stack: Vec<Context>,
	mut global_contexts: Vec<Context>,
) -> Event {
	global_contexts.push(outcome_context("failure", message.into()));
	make_event(event_types::FAILURE, location_stack, global_contexts)
}

/// A media event; `event_type` must be one of the `Media*Event` names.
pub fn make_media_event(
	event_type: &str,
	location_stack: Vec<Context>,
	global_contexts: Vec<Context>,
) -> Event {
	make_event(event_type, location_stack, global_contexts)
}

fn outcome_context(id: &str, message: String) -> Context {
	Context::new("OutcomeContext", id).with_attribute("message", message)
}
