// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::wal::StoreOp;
use std::collections::BTreeMap;
use wx_core::Watch;

/// Watches as of the last applied operation
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub watches: BTreeMap<String, Watch>,
}

impl MaterializedState {
    pub fn from_ops<'a>(ops: impl IntoIterator<Item = &'a StoreOp>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Get a watch by ID or unique prefix (like git commit hashes)
    pub fn get_watch(&self, id: &str) -> Option<&Watch> {
        if let Some(watch) = self.watches.get(id) {
            return Some(watch);
        }

        let mut matches = self.watches.range(id.to_string()..).take_while(|(k, _)| k.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some((_, watch)), None) => Some(watch),
            _ => None,
        }
    }

    /// Apply an operation to update the state
    ///
    /// A status update for an unknown watch is ignored.
    pub fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::PutWatch { watch } => {
                self.watches.insert(watch.id.clone(), watch.as_ref().clone());
            }
            StoreOp::SaveStatus { watch_id, status } => {
                if let Some(watch) = self.watches.get_mut(watch_id) {
                    watch.status = status.clone();
                }
            }
            StoreOp::DeleteWatch { watch_id } => {
                self.watches.remove(watch_id);
            }
        }
    }

    /// One `PutWatch` per live watch
    pub fn snapshot(&self) -> Vec<StoreOp> {
        self.watches
            .values()
            .map(|w| StoreOp::PutWatch {
                watch: Box::new(w.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
