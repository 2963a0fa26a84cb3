// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory watch registry

use super::{RegistryError, WatchRegistry};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wx_core::{Watch, WatchStatus};

/// Registry held entirely in memory. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    watches: Arc<Mutex<BTreeMap<String, Watch>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watches(watches: impl IntoIterator<Item = Watch>) -> Self {
        let map = watches.into_iter().map(|w| (w.id.clone(), w)).collect();
        Self {
            watches: Arc::new(Mutex::new(map)),
        }
    }

    /// Synchronous peek, for tests and diagnostics
    pub fn get(&self, id: &str) -> Option<Watch> {
        self.watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl WatchRegistry for MemoryRegistry {
    async fn load(&self, id: &str) -> Result<Option<Watch>, RegistryError> {
        Ok(self.get(id))
    }

    async fn put(&self, watch: &Watch) -> Result<(), RegistryError> {
        self.watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(watch.id.clone(), watch.clone());
        Ok(())
    }

    async fn save_status(&self, id: &str, status: &WatchStatus) -> Result<(), RegistryError> {
        let mut watches = self.watches.lock().unwrap_or_else(|e| e.into_inner());
        let watch = watches
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        watch.status = status.clone();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, RegistryError> {
        Ok(self
            .watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some())
    }

    async fn list(&self) -> Result<Vec<Watch>, RegistryError> {
        Ok(self
            .watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
