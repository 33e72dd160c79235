// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory slot storage.

use async_trait::async_trait;
use dashmap::DashMap;

use super::SlotStorage;
use crate::error::Result;

/// In-memory slot storage, primarily for testing.
#[derive(Default)]
pub struct MemorySlots {
    slots: DashMap<String, String>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl SlotStorage for MemorySlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
