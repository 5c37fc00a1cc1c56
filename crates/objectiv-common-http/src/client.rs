// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with a consistent User-Agent header.

use reqwest::{Client, ClientBuilder};

/// SDK name reported in the User-Agent header.
const SDK_NAME: &str = "objectiv-tracker-rust";

/// Creates a new HTTP client with the standard tracker User-Agent header.
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Creates a new HTTP client builder with the standard tracker User-Agent.
///
/// Use this when the client needs further customization, e.g. a timeout:
///
/// ```ignore
/// let client = objectiv_common_http::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Returns the standard tracker User-Agent string.
///
/// Format: `objectiv-tracker-rust/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"{}/{} ({}-{})",
		SDK_NAME,
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		assert!(ua.starts_with("objectiv-tracker-rust/"));
		assert!(ua.contains(env!("CARGO_PKG_VERSION")));
		assert!(ua.ends_with(')'));
	}
}
