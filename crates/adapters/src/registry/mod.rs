// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch registry: where watch definitions and statuses live

mod memory;

pub use memory::MemoryRegistry;

use async_trait::async_trait;
use thiserror::Error;
use wx_core::{Watch, WatchStatus};

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("watch not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Stores watches. A missing watch is `Ok(None)`, not an error.
#[async_trait]
pub trait WatchRegistry: Clone + Send + Sync + 'static {
    async fn load(&self, id: &str) -> Result<Option<Watch>, RegistryError>;

    /// Insert or replace a watch, including its status
    async fn put(&self, watch: &Watch) -> Result<(), RegistryError>;

    /// Replace the status of an existing watch
    async fn save_status(&self, id: &str, status: &WatchStatus) -> Result<(), RegistryError>;

    /// Returns whether the watch existed
    async fn delete(&self, id: &str) -> Result<bool, RegistryError>;

    async fn list(&self) -> Result<Vec<Watch>, RegistryError>;
}
