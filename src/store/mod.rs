// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential storage layer.
//!
//! [`CredentialStore`] is the only owner of the token pair and the cached
//! profile. It sits on top of a [`SlotStorage`] backend that keeps
//! independent string slots:
//! - [`FileSlots`] - one file per slot, survives restarts
//! - [`MemorySlots`] - in-process, for tests and ephemeral sessions

mod file;
mod memory;

pub use file::FileSlots;
pub use memory::MemorySlots;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{ApiError, Result};
use crate::models::{CredentialPair, StoredCredentials, UserProfile};

/// Slot names as constants.
pub mod slots {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// JSON-encoded `UserProfile`
    pub const CACHED_PROFILE: &str = "cachedUserProfile";

    pub const ALL: [&str; 3] = [ACCESS_TOKEN, REFRESH_TOKEN, CACHED_PROFILE];
}

/// Device-local key/value storage for credential slots.
#[async_trait]
pub trait SlotStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing a missing slot succeeds.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Name of this storage backend.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Durable access to the credential pair and the cached profile.
#[derive(Clone)]
pub struct CredentialStore {
    slots: Arc<dyn SlotStorage>,
    /// Held across multi-slot writes and clears so pairs never interleave.
    writes: Arc<Mutex<()>>,
}

impl CredentialStore {
    pub fn new(slots: impl SlotStorage + 'static) -> Self {
        Self {
            slots: Arc::new(slots),
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(MemorySlots::new())
    }

    pub fn backend_name(&self) -> &str {
        self.slots.name()
    }

    /// Persist both tokens.
    ///
    /// The two slots are written independently; a failure after the first
    /// write leaves a mismatched pair, which the next refresh or login
    /// overwrites.
    pub async fn save(&self, pair: &CredentialPair) -> Result<()> {
        let _guard = self.writes.lock().await;
        self.write_slots(&[
            (slots::ACCESS_TOKEN, pair.access.as_str()),
            (slots::REFRESH_TOKEN, pair.refresh.as_str()),
        ])
        .await?;
        tracing::debug!(backend = self.slots.name(), "Credentials saved");
        Ok(())
    }

    /// Load the current credentials. Never fails: unreadable slots are
    /// logged and reported as missing.
    pub async fn load(&self) -> StoredCredentials {
        let access_token = self.read_slot(slots::ACCESS_TOKEN).await;
        let refresh_token = self.read_slot(slots::REFRESH_TOKEN).await;
        let cached_profile = self
            .read_slot(slots::CACHED_PROFILE)
            .await
            .and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable cached profile");
                    None
                }
            });

        StoredCredentials {
            access_token,
            refresh_token,
            cached_profile,
        }
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.read_slot(slots::ACCESS_TOKEN).await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_string(profile)
            .map_err(|e| ApiError::Storage(format!("Failed to serialize profile: {}", e)))?;
        let _guard = self.writes.lock().await;
        self.write_slots(&[(slots::CACHED_PROFILE, json.as_str())])
            .await
    }

    /// Delete both tokens and the cached profile. Idempotent.
    ///
    /// Every slot is attempted; the first error is returned.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.writes.lock().await;
        let mut first_error = None;
        for key in slots::ALL {
            if let Err(e) = self.slots.remove(key).await {
                tracing::error!(slot = key, error = %e, "Failed to clear credential slot");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(backend = self.slots.name(), "Credentials cleared");
                Ok(())
            }
        }
    }

    /// Best-effort multi-slot write; stops at the first failure.
    async fn write_slots(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.slots.set(key, value).await.map_err(|e| {
                tracing::error!(slot = *key, error = %e, "Failed to write credential slot");
                e
            })?;
        }
        Ok(())
    }

    async fn read_slot(&self, key: &str) -> Option<String> {
        match self.slots.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(slot = key, error = %e, "Failed to read credential slot");
                None
            }
        }
    }
}
