// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session id persistence.
//!
//! A session id ties the events of one user visit together. Stores only keep
//! the id; the [`SessionContextPlugin`](crate::SessionContextPlugin) turns it
//! into a `SessionContext`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TrackerError};

/// Where the current session id lives.
#[async_trait]
pub trait SessionIdStore: Send + Sync {
	async fn get_session_id(&self) -> Result<Option<String>>;

	async fn store_session_id(&self, session_id: &str) -> Result<()>;

	/// Returns the stored id, creating and storing a new one if absent.
	async fn get_or_create_session_id(&self) -> Result<String> {
		if let Some(id) = self.get_session_id().await? {
			return Ok(id);
		}
		let id = Uuid::new_v4().to_string();
		self.store_session_id(&id).await?;
		debug!(session_id = %id, "Started new session");
		Ok(id)
	}
}

/// Keeps the session id in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
	session_id: RwLock<Option<String>>,
}

impl MemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SessionIdStore for MemorySessionStore {
	async fn get_session_id(&self) -> Result<Option<String>> {
		Ok(self.session_id.read().await.clone())
	}

	async fn store_session_id(&self, session_id: &str) -> Result<()> {
		*self.session_id.write().await = Some(session_id.to_string());
		Ok(())
	}
}

/// Keeps the session id in a single file.
///
/// A missing or empty file means there is no session yet.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
	path: PathBuf,
}

impl FileSessionStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl SessionIdStore for FileSessionStore {
	async fn get_session_id(&self) -> Result<Option<String>> {
		match tokio::fs::read_to_string(&self.path).await {
			Ok(contents) => {
				let id = contents.trim();
				Ok((!id.is_empty()).then(|| id.to_string()))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(TrackerError::Storage(format!(
				"failed to read {}: {e}",
				self.path.display()
			))),
		}
	}

	async fn store_session_id(&self, session_id: &str) -> Result<()> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await.map_err(|e| {
				TrackerError::Storage(format!("failed to create {}: {e}", parent.display()))
			})?;
		}

		let tmp = self.path.with_extension("tmp");
		tokio::fs::write(&tmp, session_id)
			.await
			.map_err(|e| TrackerError::Storage(format!("failed to write {}: {e}", tmp.display())))?;
		tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
			TrackerError::Storage(format!("failed to write {}: {e}", self.path.display()))
		})?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn memory_store_creates_once() {
		let store = MemorySessionStore::new();
		assert_eq!(store.get_session_id().await.unwrap(), None);

		let first = store.get_or_create_session_id().await.unwrap();
		let second = store.get_or_create_session_id().await.unwrap();
		assert_eq!(first, second);
		assert!(Uuid::parse_str(&first).is_ok());
	}

	#[tokio::test]
	async fn file_store_missing_file_means_no_session() {
		let dir = TempDir::new().unwrap();
		let store = FileSessionStore::new(dir.path().join("session"));
		assert_eq!(store.get_session_id().await.unwrap(), None);
	}

	#[tokio::test]
	async fn file_store_survives_reopen() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("nested").join("session");

		let id = FileSessionStore::new(&path)
			.get_or_create_session_id()
			.await
			.unwrap();

		let reopened = FileSessionStore::new(&path);
		assert_eq!(reopened.get_session_id().await.unwrap(), Some(id.clone()));
		assert_eq!(reopened.get_or_create_session_id().await.unwrap(), id);
	}

	#[tokio::test]
	async fn file_store_overwrites_id() {
		let dir = TempDir::new().unwrap();
		let store = FileSessionStore::new(dir.path().join("session"));

		store.store_session_id("one").await.unwrap();
		store.store_session_id("two").await.unwrap();

		assert_eq!(store.get_session_id().await.unwrap().as_deref(), Some("two"));
	}

	#[tokio::test]
	async fn file_store_reports_unreadable_path() {
		let dir = TempDir::new().unwrap();
		let store = FileSessionStore::new(dir.path());
		assert!(matches!(
			store.get_session_id().await,
			Err(TrackerError::Storage(_))
		));
	}
}
