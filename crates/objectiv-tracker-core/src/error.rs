// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the tracker data model.

use thiserror::Error;

/// Errors raised while building events, batches, or contexts.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("an event batch must contain at least one event")]
	EmptyBatch,

	#[error("invalid context: {0}")]
	InvalidContext(String),

	#[error("serialization error: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for CoreError {
	fn from(err: serde_json::Error) -> Self {
		CoreError::Serialization(err.to_string())
	}
}

/// A specialized `Result` type for data model operations.
pub type Result<T> = std::result::Result<T, CoreError>;
