// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event types for tracking user and application actions.
//!
//! An event carries a type discriminator, an ordered location stack, a set of
//! global contexts, and the times at which it was tracked and sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{Context, Contexts};
use crate::error::{CoreError, Result};

/// Well-known event type names.
pub mod event_types {
	pub const PRESS: &str = "PressEvent";
	pub const APPLICATION_LOADED: &str = "ApplicationLoadedEvent";
	pub const INPUT_CHANGE: &str = "InputChangeEvent";
	pub const SUCCESS: &str = "SuccessEvent";
	pub const FAILURE: &str = "FailureEvent";
	pub const VISIBLE: &str = "VisibleEvent";
	pub const HIDDEN: &str = "HiddenEvent";
	pub const MEDIA_LOAD: &str = "MediaLoadEvent";
	pub const MEDIA_START: &str = "MediaStartEvent";
	pub const MEDIA_PAUSE: &str = "MediaPauseEvent";
	pub const MEDIA_STOP: &str = "MediaStopEvent";
}

/// Unique identifier for an event, stable across delivery retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for EventId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::str::FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Current time truncated to the millisecond precision used on the wire.
pub fn now_millis() -> DateTime<Utc> {
	let now = Utc::now();
	DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// A tracked event.
///
/// Equality is structural, which is what tests compare against.
///
/// # Example
///
/// ```
/// use objectiv_tracker_core::{event_types, make_section_context, Event};
///
/// let event = Event::new(event_types::PRESS)
///     .with_location_stack(vec![make_section_context("checkout")]);
///
/// assert_eq!(event.event_type(), "PressEvent");
/// assert_eq!(event.location_stack().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	#[serde(rename = "_type")]
	event_type: String,
	id: EventId,
	#[serde(flatten)]
	contexts: Contexts,
	#[serde(alias = "time", with = "chrono::serde::ts_milliseconds")]
	tracking_time: DateTime<Utc>,
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "chrono::serde::ts_milliseconds_option"
	)]
	sending_time: Option<DateTime<Utc>>,
}

impl Event {
	/// Creates an event of the given type with empty contexts.
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			id: EventId::new(),
			contexts: Contexts::new(),
			tracking_time: now_millis(),
			sending_time: None,
		}
	}

	/// Sets the initial location stack (builder pattern).
	pub fn with_location_stack(mut self, location_stack: Vec<Context>) -> Self {
		let global_contexts = self.contexts.global_contexts().to_vec();
		self.contexts = Contexts::from_parts(location_stack, global_contexts);
		self
	}

	/// Sets the initial global contexts (builder pattern). Duplicates are dropped.
	pub fn with_global_contexts(mut self, global_contexts: Vec<Context>) -> Self {
		let location_stack = self.contexts.location_stack().to_vec();
		self.contexts = Contexts::from_parts(location_stack, global_contexts);
		self
	}

	/// Overrides the tracking time (builder pattern).
	pub fn with_tracking_time(mut self, tracking_time: DateTime<Utc>) -> Self {
		self.tracking_time = tracking_time;
		self
	}

	pub fn id(&self) -> EventId {
		self.id
	}

	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	pub fn contexts(&self) -> &Contexts {
		&self.contexts
	}

	/// Mutable access to the contexts, used during enrichment only.
	pub fn contexts_mut(&mut self) -> &mut Contexts {
		&mut self.contexts
	}

	pub fn location_stack(&self) -> &[Context] {
		self.contexts.location_stack()
	}

	pub fn global_contexts(&self) -> &[Context] {
		self.contexts.global_contexts()
	}

	pub fn tracking_time(&self) -> DateTime<Utc> {
		self.tracking_time
	}

	pub fn sending_time(&self) -> Option<DateTime<Utc>> {
		self.sending_time
	}

	/// Stamps the sending time. It is never earlier than the tracking time.
	pub fn set_sending_time(&mut self, sending_time: DateTime<Utc>) {
		self.sending_time = Some(sending_time.max(self.tracking_time));
	}
}

/// A non-empty list of events handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventBatch(Vec<Event>);

#[allow(clippy::len_without_is_empty)]
impl EventBatch {
	/// Wraps a list of events, rejecting an empty one.
	pub fn new(events: Vec<Event>) -> Result<Self> {
		if events.is_empty() {
			return Err(CoreError::EmptyBatch);
		}
		Ok(Self(events))
	}

	pub fn single(event: Event) -> Self {
		Self(vec![event])
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn events(&self) -> &[Event] {
		&self.0
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Event> {
		self.0.iter()
	}

	pub fn ids(&self) -> Vec<EventId> {
		self.0.iter().map(Event::id).collect()
	}

	pub fn into_inner(self) -> Vec<Event> {
		self.0
	}
}

impl IntoIterator for EventBatch {
	type Item = Event;
	type IntoIter = std::vec::IntoIter<Event>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a EventBatch {
	type Item = &'a Event;
	type IntoIter = std::slice::Iter<'a, Event>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
