// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed watch registry

use crate::state::MaterializedState;
use crate::wal::{StoreOp, Wal, WalError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use wx_adapters::{RegistryError, WatchRegistry};
use wx_core::{Watch, WatchStatus};

/// Logs longer than this (relative to live watches) are compacted on open
const COMPACT_SLACK: usize = 256;

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

/// Watch registry persisted as a write-ahead log
///
/// Every mutation is appended and synced before it becomes visible.
#[derive(Clone)]
pub struct WalRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl WalRegistry {
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let ops = Wal::replay(path)?;
        let state = MaterializedState::from_ops(&ops);
        let mut wal = Wal::open(path)?;

        let torn = wal.sequence() as usize != ops.len();
        if torn || ops.len() > state.watches.len() + COMPACT_SLACK {
            tracing::info!(
                entries = ops.len(),
                watches = state.watches.len(),
                torn,
                "compacting watch log"
            );
            wal.compact(&state.snapshot())?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner { wal, state })),
        })
    }

    /// Rewrite the log as one entry per live watch
    pub fn compact(&self) -> Result<(), WalError> {
        let mut inner = self.lock();
        let ops = inner.state.snapshot();
        inner.wal.compact(&ops)
    }

    /// Watch by exact id or unique prefix
    pub fn find(&self, id_or_prefix: &str) -> Option<Watch> {
        self.lock().state.get_watch(id_or_prefix).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn commit(inner: &mut Inner, op: StoreOp) -> Result<(), RegistryError> {
        inner
            .wal
            .append(&op)
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        inner.state.apply(&op);
        Ok(())
    }
}

#[async_trait]
impl WatchRegistry for WalRegistry {
    async fn load(&self, id: &str) -> Result<Option<Watch>, RegistryError> {
        Ok(self.lock().state.watches.get(id).cloned())
    }

    async fn put(&self, watch: &Watch) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        Self::commit(
            &mut inner,
            StoreOp::PutWatch {
                watch: Box::new(watch.clone()),
            },
        )
    }

    async fn save_status(&self, id: &str, status: &WatchStatus) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        if !inner.state.watches.contains_key(id) {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Self::commit(
            &mut inner,
            StoreOp::SaveStatus {
                watch_id: id.to_string(),
                status: status.clone(),
            },
        )
    }

    async fn delete(&self, id: &str) -> Result<bool, RegistryError> {
        let mut inner = self.lock();
        if !inner.state.watches.contains_key(id) {
            return Ok(false);
        }
        Self::commit(
            &mut inner,
            StoreOp::DeleteWatch {
                watch_id: id.to_string(),
            },
        )?;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Watch>, RegistryError> {
        Ok(self.lock().state.watches.values().cloned().collect())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
