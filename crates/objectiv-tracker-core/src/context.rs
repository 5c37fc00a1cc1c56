// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Context types: typed, identified metadata attached to events.
//!
//! A context either describes where in the UI an event happened (a location
//! context, kept in an ordered stack) or an ambient fact about the
//! environment (a global context, kept as a set keyed by type and id).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known context type names.
pub mod context_types {
	pub const ROOT_LOCATION: &str = "RootLocationContext";
	pub const SECTION: &str = "SectionContext";
	pub const NAVIGATION: &str = "NavigationContext";
	pub const OVERLAY: &str = "OverlayContext";
	pub const CONTENT: &str = "ContentContext";
	pub const EXPANDABLE: &str = "ExpandableContext";
	pub const PRESSABLE: &str = "PressableContext";
	pub const LINK: &str = "LinkContext";
	pub const INPUT: &str = "InputContext";

	pub const APPLICATION: &str = "ApplicationContext";
	pub const HTTP: &str = "HttpContext";
	pub const PATH: &str = "PathContext";
	pub const SESSION: &str = "SessionContext";
	pub const COOKIE_ID: &str = "CookieIdContext";
	pub const IDENTITY: &str = "IdentityContext";
	pub const INPUT_VALUE: &str = "InputValueContext";
	pub const MARKETING: &str = "MarketingContext";

	/// Types that belong in the location stack.
	pub const LOCATION_TYPES: &[&str] = &[
		ROOT_LOCATION,
		SECTION,
		NAVIGATION,
		OVERLAY,
		CONTENT,
		EXPANDABLE,
		PRESSABLE,
		LINK,
		INPUT,
	];

	/// Global types that may appear more than once with the same id.
	pub const DUPLICATES_ALLOWED: &[&str] = &[IDENTITY, INPUT_VALUE];
}

/// Whether a context belongs in the location stack or the global set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
	Location,
	Global,
}

impl ContextKind {
	/// Classifies a context type name. Unknown types are treated as global.
	pub fn of(context_type: &str) -> Self {
		if context_types::LOCATION_TYPES.contains(&context_type) {
			ContextKind::Location
		} else {
			ContextKind::Global
		}
	}

	/// The path segment used by the taxonomy documentation.
	pub fn docs_segment(&self) -> &'static str {
		match self {
			ContextKind::Location => "location-contexts",
			ContextKind::Global => "global-contexts",
		}
	}
}

/// Returns true if global contexts of this type may share an id.
pub fn allows_duplicate_globals(context_type: &str) -> bool {
	context_types::DUPLICATES_ALLOWED.contains(&context_type)
}

/// A single context record.
///
/// Serialized as `{"_type": ..., "id": ..., <attributes>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
	#[serde(rename = "_type")]
	pub context_type: String,
	pub id: String,
	#[serde(flatten)]
	pub attributes: Map<String, Value>,
}

impl Context {
	/// Creates a context with no type-specific attributes.
	pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
		Self {
			context_type: context_type.into(),
			id: id.into(),
			attributes: Map::new(),
		}
	}

	/// Sets an attribute (builder pattern).
	pub fn with_attribute<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.attributes.insert(key.into(), value.into());
		self
	}

	pub fn attribute(&self, key: &str) -> Option<&Value> {
		self.attributes.get(key)
	}

	pub fn kind(&self) -> ContextKind {
		ContextKind::of(&self.context_type)
	}

	pub fn is(&self, context_type: &str) -> bool {
		self.context_type == context_type
	}

	/// The `(context_type, id)` identity of this context.
	pub fn key(&self) -> (&str, &str) {
		(&self.context_type, &self.id)
	}
}

/// The mutable context containers of an event.
///
/// Contexts can only be appended (or, for the location stack, prefixed);
/// nothing can be removed. Global contexts are kept
/// unique by `(context_type, id)` unless the type allows duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contexts {
	#[serde(default)]
	location_stack: Vec<Context>,
	#[serde(default)]
	global_contexts: Vec<Context>,
}

impl Contexts {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds containers from initial lists. Duplicate globals are dropped.
	pub fn from_parts(location_stack: Vec<Context>, global_contexts: Vec<Context>) -> Self {
		let mut contexts = Self {
			location_stack,
			global_contexts: Vec::with_capacity(global_contexts.len()),
		};
		contexts.extend_global(global_contexts);
		contexts
	}

	pub fn location_stack(&self) -> &[Context] {
		&self.location_stack
	}

	pub fn global_contexts(&self) -> &[Context] {
		&self.global_contexts
	}

	/// Appends a context to the innermost end of the location stack.
	pub fn push_location(&mut self, context: Context) {
		self.location_stack.push(context);
	}

	/// Inserts a context at the outermost position of the location stack.
	pub fn prepend_location(&mut self, context: Context) {
		self.location_stack.insert(0, context);
	}

	/// Inserts a sequence of contexts, in order, before the current stack.
	pub fn prepend_locations(&mut self, contexts: impl IntoIterator<Item = Context>) {
		let mut stack: Vec<Context> = contexts.into_iter().collect();
		stack.append(&mut self.location_stack);
		self.location_stack = stack;
	}

	/// Adds a global context.
	///
	/// Returns `false` (and drops the context) when a context with the same
	/// type and id is already present and the type does not allow duplicates.
	pub fn push_global(&mut self, context: Context) -> bool {
		if !allows_duplicate_globals(&context.context_type)
			&& self.global_contexts.iter().any(|c| c.key() == context.key())
		{
			return false;
		}
		self.global_contexts.push(context);
		true
	}

	/// Adds several global contexts, returning how many were accepted.
	pub fn extend_global(&mut self, contexts: impl IntoIterator<Item = Context>) -> usize {
		contexts
			.into_iter()
			.map(|c| self.push_global(c))
			.filter(|added| *added)
			.count()
	}

	pub fn has_global(&self, context_type: &str) -> bool {
		self.global_contexts.iter().any(|c| c.is(context_type))
	}

	pub fn count_global(&self, context_type: &str) -> usize {
		self.global_contexts.iter().filter(|c| c.is(context_type)).count()
	}

	pub fn find_global(&self, context_type: &str) -> Option<&Context> {
		self.global_contexts.iter().find(|c| c.is(context_type))
	}

	pub fn count_location(&self, context_type: &str) -> usize {
		self.location_stack.iter().filter(|c| c.is(context_type)).count()
	}

	/// Index of the first location context of the given type.
	pub fn location_position(&self, context_type: &str) -> Option<usize> {
		self.location_stack.iter().position(|c| c.is(context_type))
	}
}
