// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the tracker SDK.

use objectiv_common_http::{is_retryable_status, RetryableError};
use objectiv_tracker_core::CoreError;
use thiserror::Error;

/// Tracker SDK errors.
#[derive(Debug, Error)]
pub enum TrackerError {
	/// Both a transport and an endpoint were configured.
	#[error("a tracker takes either a transport or an endpoint, not both")]
	ConflictingTransport,

	/// Neither a transport nor an endpoint was configured.
	#[error("a tracker needs either a transport or an endpoint")]
	MissingTransport,

	/// The collector endpoint is not an absolute http(s) URL.
	#[error("invalid collector endpoint: {0}")]
	InvalidEndpoint(String),

	/// Delivery to the collector failed.
	///
	/// `status` is the HTTP status for rejected requests and `None` for
	/// network errors.
	#[error("{transport} send failed ({}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "network error".to_string()))]
	SendFailed {
		transport: String,
		status: Option<u16>,
		message: String,
	},

	/// No transport in the chain can be used in this environment.
	#[error("no usable transport")]
	NoUsableTransport,

	/// A plugin failed during a lifecycle hook.
	#[error("plugin {plugin} failed: {message}")]
	Plugin { plugin: String, message: String },

	/// A plugin with the same name is already registered.
	#[error("plugin {0} is already registered")]
	DuplicatePlugin(String),

	/// The tracker has been shut down.
	#[error("tracker has been shut down")]
	ClientShutdown,

	/// Serialization error.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Session store I/O failed.
	#[error("storage error: {0}")]
	Storage(String),

	/// A shared lock was poisoned by a panicking holder.
	#[error("failed to acquire lock")]
	LockPoisoned,

	/// Invalid event data.
	#[error(transparent)]
	Core(#[from] CoreError),
}

impl TrackerError {
	/// Builds a `SendFailed` for a network-level error.
	pub fn network(transport: impl Into<String>, err: impl std::fmt::Display) -> Self {
		TrackerError::SendFailed {
			transport: transport.into(),
			status: None,
			message: err.to_string(),
		}
	}

	/// Builds a `SendFailed` for a rejected request.
	pub fn rejected(transport: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
		TrackerError::SendFailed {
			transport: transport.into(),
			status: Some(status),
			message: message.into(),
		}
	}

	/// Returns true for delivery failures.
	pub fn is_send_failure(&self) -> bool {
		matches!(self, TrackerError::SendFailed { .. })
	}
}

impl RetryableError for TrackerError {
	fn is_retryable(&self) -> bool {
		match self {
			TrackerError::SendFailed { status: None, .. } => true,
			TrackerError::SendFailed {
				status: Some(status),
				..
			} => is_retryable_status(*status),
			_ => false,
		}
	}
}

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_send_failed_retryable_statuses() {
		for status in [429, 408, 500, 502, 503, 504] {
			let err = TrackerError::rejected("http", status, "test");
			assert!(err.is_retryable(), "status {status} should be retryable");
		}
	}

	#[test]
	fn test_send_failed_non_retryable_statuses() {
		for status in [400, 401, 403, 404, 422] {
			let err = TrackerError::rejected("http", status, "test");
			assert!(!err.is_retryable(), "status {status} should not be retryable");
		}
	}

	#[test]
	fn test_network_error_is_retryable_send_failure() {
		let err = TrackerError::network("http", "connection refused");
		assert!(err.is_send_failure());
		assert!(err.is_retryable());
		assert_eq!(
			err.to_string(),
			"http send failed (network error): connection refused"
		);
	}

	#[test]
	fn test_rejected_message_includes_status() {
		let err = TrackerError::rejected("http", 500, "boom");
		assert_eq!(err.to_string(), "http send failed (500): boom");
	}

	#[test]
	fn test_configuration_errors_not_retryable() {
		assert!(!TrackerError::ConflictingTransport.is_retryable());
		assert!(!TrackerError::MissingTransport.is_retryable());
		assert!(!TrackerError::NoUsableTransport.is_send_failure());
	}

	#[test]
	fn test_client_shutdown_not_retryable() {
		assert!(!TrackerError::ClientShutdown.is_retryable());
	}
}
