// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution history as JSON lines

use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wx_adapters::{HistoryError, HistorySink};
use wx_core::ExecutionRecord;

/// Append-only history file, one record per line
#[derive(Clone)]
pub struct HistoryLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl HistoryLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent records, newest first, optionally for one watch
    ///
    /// Unreadable lines are skipped.
    pub fn recent(
        &self,
        watch_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, HistoryError> {
        let file = File::open(&self.path).map_err(|e| HistoryError::Write(e.to_string()))?;
        let mut records: Vec<ExecutionRecord> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ExecutionRecord>(&line).ok())
            .filter(|r| watch_id.map_or(true, |id| r.watch_id == id))
            .collect();
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}

#[async_trait]
impl HistorySink for HistoryLog {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), HistoryError> {
        let line =
            serde_json::to_string(record).map_err(|e| HistoryError::Write(e.to_string()))?;
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(file, "{}", line).map_err(|e| HistoryError::Write(e.to_string()))?;
        file.flush().map_err(|e| HistoryError::Write(e.to_string()))
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
