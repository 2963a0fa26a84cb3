// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads watch definition files from a directory

use crate::parser::{parse_watch, Format, ParseError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use wx_core::Watch;

/// Outcome of loading a directory. One bad file never blocks the rest.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub watches: Vec<Watch>,
    pub errors: Vec<(PathBuf, ParseError)>,
}

/// Load a single `.toml` or `.json` file. The file stem is the default id.
pub fn load_watch_file(path: &Path) -> Result<Watch, ParseError> {
    let format = Format::from_path(path).ok_or_else(|| {
        ParseError::InvalidFormat(format!("{}: expected .toml or .json", path.display()))
    })?;
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let stem = path.file_stem().and_then(|s| s.to_str());
    parse_watch(&content, format, stem)
}

/// Load every watch file in `dir`, in file name order.
///
/// Files with other extensions are ignored. A watch whose id was already
/// loaded from an earlier file is reported as an error.
pub fn load_watches_dir(dir: &Path) -> Result<LoadReport, ParseError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ParseError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && Format::from_path(path).is_some())
        .collect();
    paths.sort();

    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    for path in paths {
        match load_watch_file(&path) {
            Ok(watch) if !seen.insert(watch.id.clone()) => {
                let err = ParseError::InvalidFormat(format!("duplicate watch id '{}'", watch.id));
                tracing::warn!(path = %path.display(), error = %err, "skipping watch file");
                report.errors.push((path, err));
            }
            Ok(watch) => {
                tracing::debug!(path = %path.display(), watch_id = %watch.id, "loaded watch");
                report.watches.push(watch);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping watch file");
                report.errors.push((path, err));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
