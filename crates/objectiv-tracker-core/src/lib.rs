// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Objectiv tracker.
//!
//! This crate holds the data model shared by the tracking pipeline
//! (`objectiv-tracker`) and anything that inspects tracked events:
//!
//! - [`Context`] and the append-only [`Contexts`] containers
//! - [`Event`] and the non-empty [`EventBatch`] handed to transports
//! - `make_*` constructors for the well-known contexts and events
//! - Validation rules producing a structured [`ValidationReport`]
//!
//! # Example
//!
//! ```
//! use objectiv_tracker_core::{
//!     make_application_context, make_press_event, make_pressable_context,
//!     make_root_location_context, GlobalContextRule, ValidationRule,
//! };
//!
//! let event = make_press_event(
//!     vec![
//!         make_root_location_context("home"),
//!         make_pressable_context("signup", Some("Sign up".to_string())),
//!     ],
//!     vec![make_application_context("website")],
//! );
//!
//! let report = GlobalContextRule::new("ApplicationContext").once().validate(&event, None);
//! assert!(report.is_valid());
//! ```

pub mod context;
pub mod error;
pub mod event;
pub mod factories;
pub mod validation;

pub use context::{allows_duplicate_globals, context_types, Context, ContextKind, Contexts};
pub use error::{CoreError, Result};
pub use event::{event_types, now_millis, Event, EventBatch, EventId};
pub use factories::*;
pub use validation::{
	docs_url, FailureKind, GlobalContextRule, LocationContextRule, UniqueGlobalContextRule,
	ValidationFailure, ValidationReport, ValidationRule, DOCS_BASE_URL,
};
