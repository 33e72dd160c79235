// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-based slot storage.
//!
//! Each slot is one file named after its key. Values are base64 encoded so
//! tokens are not casually readable, written to a temporary file and renamed
//! into place, and restricted to the owner on Unix. Every write gets its own
//! temporary file, so concurrent writers of one slot never collide and the
//! last rename wins.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::SlotStorage;
use crate::error::{ApiError, Result};

/// Slot storage rooted at a directory.
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    /// Create storage in `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ApiError::Storage(format!("Invalid slot name: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.slot", key)))
    }
}

/// Distinguishes temporary files of concurrent writes within this process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_path(path: &Path) -> PathBuf {
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("slot.{}-{}.tmp", std::process::id(), seq))
}

async fn write_restricted(tmp: &Path, contents: String) -> std::io::Result<()> {
    tokio::fs::write(tmp, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(tmp, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

fn storage_io(path: &Path, err: std::io::Error) -> ApiError {
    ApiError::Storage(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl SlotStorage for FileSlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        let encoded = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_io(&path, e)),
        };

        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| ApiError::Storage(format!("{}: corrupt slot: {}", path.display(), e)))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| ApiError::Storage(format!("{}: corrupt slot: {}", path.display(), e)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_io(&self.dir, e))?;

        let tmp = temp_path(&path);
        let written = match write_restricted(&tmp, BASE64.encode(value.as_bytes())).await {
            Ok(()) => tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| storage_io(&path, e)),
            Err(e) => Err(storage_io(&tmp, e)),
        };
        if let Err(e) = written {
            // Best effort; the file may not exist.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        tracing::debug!(slot = key, "Slot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_io(&path, e)),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}
