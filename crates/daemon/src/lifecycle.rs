// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, watch sync, shutdown.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};
use wx_adapters::{
    Channels, HttpDataSource, JinjaScriptEngine, LoggingChannel, RoutedDataSource, StaticGate,
    TracedChannel, TracedDataSource, WebhookChannel,
};
use wx_core::{ScheduleError, SystemClock, UuidIdGen};
use wx_engine::{EngineError, RunnerDeps, WatchService};
use wx_storage::{DocumentIndex, HistoryLog, WalError, WalRegistry};
use wx_watch::load_watches_dir;

use crate::config::Config;

/// Search inputs read the local document index; http inputs go out over the network
pub type DaemonSource = TracedDataSource<RoutedDataSource<DocumentIndex, HttpDataSource>>;

/// Watch service with the daemon's concrete collaborators
pub type DaemonService = WatchService<
    WalRegistry,
    DaemonSource,
    JinjaScriptEngine,
    HistoryLog,
    StaticGate,
    SystemClock,
    UuidIdGen,
>;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid schedule settings: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// What a watch directory sync changed
#[derive(Debug, Default)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// Files or watches that could not be stored, with the reason
    pub errors: Vec<(String, String)>,
}

/// Daemon state during operation
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub service: DaemonService,
    registry: WalRegistry,
    pub start_time: Instant,
}

impl Daemon {
    /// Stop the service, compact the log and remove the PID file. The lock
    /// itself is released when `self` drops.
    ///
    /// Returns false when in-flight executions had to be abandoned.
    pub async fn shutdown(self) -> Result<bool, LifecycleError> {
        info!("Shutting down daemon...");

        let clean = self.service.stop().await;
        if !clean {
            warn!(
                stop_timeout = ?self.config.engine.stop_timeout,
                "executions still running at shutdown were abandoned"
            );
        }

        if let Err(e) = self.registry.compact() {
            warn!(error = %e, "failed to compact watch log");
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove PID file");
            }
        }

        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Daemon shutdown complete");
        Ok(clean)
    }
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let lock_file = acquire_lock(config)?;
    match startup_inner(config, lock_file).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // Only reached after the lock was ours
            let _ = std::fs::remove_file(&config.lock_path);
            Err(e)
        }
    }
}

fn acquire_lock(config: &Config) -> Result<File, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating: a running daemon's PID must survive a failed attempt
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

async fn startup_inner(config: &Config, lock_file: File) -> Result<Daemon, LifecycleError> {
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let registry = WalRegistry::open(&config.wal_path)?;
    let history = HistoryLog::open(&config.history_path)?;
    let index = DocumentIndex::open(&config.index_dir)?;

    let deps = RunnerDeps {
        registry: registry.clone(),
        source: TracedDataSource::new(RoutedDataSource::new(index.clone(), HttpDataSource::new())),
        scripts: JinjaScriptEngine::new(),
        history,
        gate: StaticGate::new(config.enabled),
        channels: Channels::new()
            .with("logging", TracedChannel::new(LoggingChannel::new()))
            .with(
                "webhook",
                TracedChannel::new(WebhookChannel::new(config.engine.action_timeout)),
            )
            .with("index", TracedChannel::new(index)),
    };
    let service = WatchService::new(deps, SystemClock, UuidIdGen, config.engine.clone())?;

    let report = sync_watches(&service, &config.watches_dir).await;
    info!(
        added = report.added.len(),
        updated = report.updated.len(),
        unchanged = report.unchanged.len(),
        errors = report.errors.len(),
        watches_dir = %config.watches_dir.display(),
        "watch definitions synced"
    );

    let unscheduled = service.start().await?;
    if !unscheduled.is_empty() {
        warn!(count = unscheduled.len(), "some watches could not be scheduled");
    }
    if !config.enabled {
        warn!("watch execution is disabled; firings will be recorded as gate denied");
    }

    info!(state_dir = %config.state_dir.display(), "Daemon started");

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        service,
        registry,
        start_time: Instant::now(),
    })
}

/// Put every new or changed definition in `dir` through the service.
///
/// Stored statuses are kept. Watches already in the registry but absent from
/// `dir` are left alone. A missing directory syncs nothing.
pub async fn sync_watches(service: &DaemonService, dir: &Path) -> SyncReport {
    let mut report = SyncReport::default();
    if !dir.is_dir() {
        info!(watches_dir = %dir.display(), "no watches directory; nothing to sync");
        return report;
    }

    let loaded = match load_watches_dir(dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(error = %e, "failed to read watches directory");
            report.errors.push((dir.display().to_string(), e.to_string()));
            return report;
        }
    };
    for (path, error) in loaded.errors {
        report.errors.push((path.display().to_string(), error.to_string()));
    }

    for watch in loaded.watches {
        let id = watch.id.clone();
        let existing = match service.get_watch(&id).await {
            Ok(view) => view.map(|v| v.watch),
            Err(e) => {
                report.errors.push((id, e.to_string()));
                continue;
            }
        };
        if existing.as_ref().is_some_and(|w| w.same_definition(&watch)) {
            report.unchanged.push(id);
            continue;
        }
        match service.put_watch(watch).await {
            Ok(_) if existing.is_some() => report.updated.push(id),
            Ok(_) => report.added.push(id),
            Err(e) => {
                warn!(watch_id = %id, error = %e, "failed to store watch");
                report.errors.push((id, e.to_string()));
            }
        }
    }
    report
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
