// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state directory layout plus the optional `wxd.toml`

use crate::lifecycle::LifecycleError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use wx_engine::EngineConfig;

const CONFIG_FILE: &str = "wxd.toml";
const DEFAULT_LOG_FILTER: &str = "info";

/// Keys accepted in the configuration file
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    watches_dir: Option<PathBuf>,
    log_filter: Option<String>,
    enabled: bool,
    engine: EngineConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            watches_dir: None,
            log_filter: None,
            enabled: true,
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    /// Configuration file; it need not exist
    pub config_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    /// Watch definitions and statuses
    pub wal_path: PathBuf,
    pub history_path: PathBuf,
    /// Documents written by `index` actions and read by `search` inputs
    pub index_dir: PathBuf,
    /// Definition files synced into the registry at startup
    pub watches_dir: PathBuf,
    pub log_filter: String,
    /// Feature gate: when false every firing is recorded as gate-denied
    pub enabled: bool,
    pub engine: EngineConfig,
}

impl Config {
    /// Resolve from the process environment
    pub fn from_env() -> Result<Self, LifecycleError> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let state_dir = resolve_state_dir(env)?;
        let config_path = env("WX_CONFIG").map(PathBuf::from);
        Self::load(&state_dir, config_path.as_deref())
    }

    /// Lay out `state_dir` and read the configuration file, if present
    pub fn load(state_dir: &Path, config_path: Option<&Path>) -> Result<Self, LifecycleError> {
        let config_path = config_path.map_or_else(|| state_dir.join(CONFIG_FILE), Path::to_path_buf);
        let file = read_file(&config_path)?;

        let base = config_path.parent().unwrap_or(state_dir);
        let watches_dir = match file.watches_dir {
            Some(dir) if dir.is_relative() => base.join(dir),
            Some(dir) => dir,
            None => state_dir.join("watches"),
        };
        file.engine.zone()?;

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            config_path,
            lock_path: state_dir.join("wxd.pid"),
            log_path: state_dir.join("wxd.log"),
            wal_path: state_dir.join("wal").join("watches.wal"),
            history_path: state_dir.join("history.jsonl"),
            index_dir: state_dir.join("index"),
            watches_dir,
            log_filter: file.log_filter.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            enabled: file.enabled,
            engine: file.engine,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, LifecycleError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&content).map_err(|source| LifecycleError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// `$WX_STATE_DIR`, then `$XDG_STATE_HOME/wx`, then `~/.local/state/wx`
pub fn resolve_state_dir(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = env("WX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = env("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("wx"));
    }
    let home = env("HOME").ok_or(LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/wx"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
