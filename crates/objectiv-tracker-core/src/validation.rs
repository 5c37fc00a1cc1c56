// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation rules and structured validation reports.
//!
//! Rules never fail an event. They return a [`ValidationReport`] describing
//! what is missing, duplicated or misplaced; callers decide how to surface it
//! (the tracker logs it).

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::context::{allows_duplicate_globals, ContextKind};
use crate::event::Event;

/// Base URL of the taxonomy reference linked from failure messages.
pub const DOCS_BASE_URL: &str = "https://objectiv.io/docs/taxonomy/reference";

/// What a rule found wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	Missing,
	Duplicated,
	WrongPosition { expected: usize, actual: Option<usize> },
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
	pub rule: String,
	pub plugin: Option<String>,
	pub context_type: String,
	pub kind: FailureKind,
	pub message: String,
}

impl ValidationFailure {
	pub fn new(
		rule: &str,
		plugin: Option<&str>,
		context_type: &str,
		kind: FailureKind,
	) -> Self {
		let message = describe(plugin, context_type, &kind);
		Self {
			rule: rule.to_string(),
			plugin: plugin.map(str::to_string),
			context_type: context_type.to_string(),
			kind,
			message,
		}
	}
}

impl fmt::Display for ValidationFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

/// Link to the taxonomy page of a context type.
pub fn docs_url(context_type: &str) -> String {
	format!(
		"{}/{}/{}",
		DOCS_BASE_URL,
		ContextKind::of(context_type).docs_segment(),
		context_type
	)
}

fn describe(plugin: Option<&str>, context_type: &str, kind: &FailureKind) -> String {
	let container = match ContextKind::of(context_type) {
		ContextKind::Location => "Location Stack",
		ContextKind::Global => "Global Contexts",
	};
	let problem = match kind {
		FailureKind::Missing => format!("{context_type} is missing from {container}."),
		FailureKind::Duplicated => {
			format!("Only one {context_type} should be present in {container}.")
		}
		FailureKind::WrongPosition { expected, actual } => match actual {
			Some(actual) => format!(
				"{context_type} is in the wrong position of the {container}: expected {expected}, found {actual}."
			),
			None => format!("{context_type} should be at position {expected} of the {container}."),
		},
	};
	let prefix = plugin.map(|p| format!("[objectiv:{p}] ")).unwrap_or_default();
	format!(
		"{prefix}{problem} Taxonomy documentation: {}",
		docs_url(context_type)
	)
}

/// The outcome of running one or more rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
	failures: Vec<ValidationFailure>,
}

impl ValidationReport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_valid(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn failures(&self) -> &[ValidationFailure] {
		&self.failures
	}

	pub fn push(&mut self, failure: ValidationFailure) {
		self.failures.push(failure);
	}

	/// Appends the failures of another report.
	pub fn merge(&mut self, other: ValidationReport) {
		self.failures.extend(other.failures);
	}

	pub fn into_failures(self) -> Vec<ValidationFailure> {
		self.failures
	}
}

/// A pass/fail check over a fully enriched event.
pub trait ValidationRule: Send + Sync {
	fn name(&self) -> &str;

	/// Checks the event. `plugin` names the owner for failure messages.
	fn validate(&self, event: &Event, plugin: Option<&str>) -> ValidationReport;
}

/// Requires a global context of a type, optionally exactly once.
#[derive(Debug, Clone)]
pub struct GlobalContextRule {
	pub context_type: String,
	pub once: bool,
}

impl GlobalContextRule {
	pub fn new(context_type: impl Into<String>) -> Self {
		Self {
			context_type: context_type.into(),
			once: false,
		}
	}

	pub fn once(mut self) -> Self {
		self.once = true;
		self
	}
}

impl ValidationRule for GlobalContextRule {
	fn name(&self) -> &str {
		"GlobalContextValidationRule"
	}

	fn validate(&self, event: &Event, plugin: Option<&str>) -> ValidationReport {
		let mut report = ValidationReport::new();
		let count = event.contexts().count_global(&self.context_type);
		if count == 0 {
			report.push(ValidationFailure::new(
				self.name(),
				plugin,
				&self.context_type,
				FailureKind::Missing,
			));
		} else if self.once && count > 1 {
			report.push(ValidationFailure::new(
				self.name(),
				plugin,
				&self.context_type,
				FailureKind::Duplicated,
			));
		}
		report
	}
}

/// Requires a location context of a type, optionally exactly once and at a
/// fixed index of the stack.
#[derive(Debug, Clone)]
pub struct LocationContextRule {
	pub context_type: String,
	pub once: bool,
	pub position: Option<usize>,
}

impl LocationContextRule {
	pub fn new(context_type: impl Into<String>) -> Self {
		Self {
			context_type: context_type.into(),
			once: false,
			position: None,
		}
	}

	pub fn once(mut self) -> Self {
		self.once = true;
		self
	}

	pub fn at_position(mut self, position: usize) -> Self {
		self.position = Some(position);
		self
	}
}

impl ValidationRule for LocationContextRule {
	fn name(&self) -> &str {
		"LocationContextValidationRule"
	}

	fn validate(&self, event: &Event, plugin: Option<&str>) -> ValidationReport {
		let mut report = ValidationReport::new();
		let contexts = event.contexts();
		let count = contexts.count_location(&self.context_type);

		if count == 0 {
			report.push(ValidationFailure::new(
				self.name(),
				plugin,
				&self.context_type,
				FailureKind::Missing,
			));
			return report;
		}

		if self.once && count > 1 {
			report.push(ValidationFailure::new(
				self.name(),
				plugin,
				&self.context_type,
				FailureKind::Duplicated,
			));
		}

		if let Some(expected) = self.position {
			let actual = contexts.location_position(&self.context_type);
			if actual != Some(expected) {
				report.push(ValidationFailure::new(
					self.name(),
					plugin,
					&self.context_type,
					FailureKind::WrongPosition { expected, actual },
				));
			}
		}

		report
	}
}

/// Rejects global contexts that share a type and id, except for types that
/// allow duplicates.
#[derive(Debug, Clone, Default)]
pub struct UniqueGlobalContextRule;

impl ValidationRule for UniqueGlobalContextRule {
	fn name(&self) -> &str {
		"UniqueGlobalContextValidationRule"
	}

	fn validate(&self, event: &Event, plugin: Option<&str>) -> ValidationReport {
		let mut report = ValidationReport::new();
		let mut seen = HashSet::new();
		let mut reported = HashSet::new();

		for ctx in event.global_contexts() {
			if allows_duplicate_globals(&ctx.context_type) {
				continue;
			}
			if !seen.insert(ctx.key()) && reported.insert(ctx.key()) {
				report.push(ValidationFailure::new(
					self.name(),
					plugin,
					&ctx.context_type,
					FailureKind::Duplicated,
				));
			}
		}

		report
	}
}
