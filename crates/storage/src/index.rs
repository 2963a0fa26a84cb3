// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local document index
//!
//! Each index is a JSON-lines file `<dir>/<index>.jsonl` of
//! `{"_id": .., "_source": ..}` entries. Writing an existing id replaces the
//! earlier document.
//!
//! Searches accept a small query language:
//! - `{"match_all": {}}` (also the default when `query` is absent)
//! - `{"term": {"path.to.field": value}}`
//! - `{"range": {"path": {"gte": x, "lt": y}}}`
//! - `{"bool": {"must": [query, ..]}}`
//!
//! Results use `{"hits": {"total": n, "hits": [{"_index", "_id", "_source"}]}}`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wx_adapters::{ChannelError, DataSource, NotifyChannel, Query, RenderedAction, SourceError};
use wx_core::execution::resolve_path;
use wx_core::{CompareOp, IdGen, UuidIdGen};

const DEFAULT_SIZE: usize = 10;

#[derive(Clone)]
pub struct DocumentIndex {
    dir: PathBuf,
    ids: UuidIdGen,
    write_lock: Arc<Mutex<()>>,
}

impl DocumentIndex {
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            ids: UuidIdGen,
            write_lock: Arc::default(),
        })
    }

    /// Store a document, returning its id
    pub fn put(&self, index: &str, doc_id: Option<&str>, document: &Value) -> io::Result<String> {
        let path = self.index_path(index)?;
        let id = doc_id.map_or_else(|| self.ids.next(), str::to_string);
        let line = serde_json::to_string(&json!({ "_id": id, "_source": document }))?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(id)
    }

    /// Live documents of an index, in first-write order
    pub fn documents(&self, index: &str) -> io::Result<Vec<(String, Value)>> {
        let path = self.index_path(index)?;
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut docs: Vec<(String, Value)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let Ok(mut entry) = serde_json::from_str::<Map<String, Value>>(&line) else {
                continue;
            };
            let Some(Value::String(id)) = entry.remove("_id") else {
                continue;
            };
            let source = entry.remove("_source").unwrap_or(Value::Null);
            match positions.get(&id) {
                Some(&pos) => docs[pos].1 = source,
                None => {
                    positions.insert(id.clone(), docs.len());
                    docs.push((id, source));
                }
            }
        }
        Ok(docs)
    }

    pub fn search(&self, indices: &[String], body: &Value) -> Result<Value, SourceError> {
        let query = body.get("query").cloned().unwrap_or_else(|| json!({ "match_all": {} }));
        let size = body
            .get("size")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_SIZE, |s| s as usize);

        let mut total = 0usize;
        let mut hits = Vec::new();
        for index in indices {
            let docs = self
                .documents(index)
                .map_err(|e| SourceError::Request(e.to_string()))?;
            for (id, source) in docs {
                if !matches_query(&query, &source)? {
                    continue;
                }
                total += 1;
                if hits.len() < size {
                    hits.push(json!({ "_index": index, "_id": id, "_source": source }));
                }
            }
        }

        Ok(json!({ "hits": { "total": total, "hits": hits } }))
    }

    fn index_path(&self, index: &str) -> io::Result<PathBuf> {
        let valid = !index.is_empty()
            && index
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !index.starts_with('.');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid index name '{}'", index),
            ));
        }
        Ok(self.dir.join(format!("{}.jsonl", index)))
    }
}

fn matches_query(query: &Value, doc: &Value) -> Result<bool, SourceError> {
    let Some((clause, args)) = query.as_object().and_then(|o| o.iter().next()) else {
        return Err(SourceError::Request("query must be a single-clause object".to_string()));
    };

    match clause.as_str() {
        "match_all" => Ok(true),
        "term" => {
            let fields = args.as_object().map(Map::iter).into_iter().flatten();
            Ok(fields.into_iter().all(|(path, expected)| {
                resolve_path(doc, path).is_some_and(|actual| CompareOp::Eq.matches(actual, expected))
            }))
        }
        "range" => {
            let fields = args.as_object().map(Map::iter).into_iter().flatten();
            for (path, bounds) in fields {
                let Some(actual) = resolve_path(doc, path) else {
                    return Ok(false);
                };
                for (op, bound) in bounds.as_object().map(Map::iter).into_iter().flatten() {
                    let op = match op.as_str() {
                        "gt" => CompareOp::Gt,
                        "gte" => CompareOp::Gte,
                        "lt" => CompareOp::Lt,
                        "lte" => CompareOp::Lte,
                        other => {
                            return Err(SourceError::Request(format!(
                                "unsupported range operator '{}'",
                                other
                            )))
                        }
                    };
                    if !op.matches(actual, bound) {
                        return Ok(false);
                    }
                }
            }
            Ok(true)
        }
        "bool" => {
            let must = args.get("must").and_then(Value::as_array);
            for sub in must.into_iter().flatten() {
                if !matches_query(sub, doc)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        other => Err(SourceError::Request(format!("unsupported query clause '{}'", other))),
    }
}

#[async_trait]
impl NotifyChannel for DocumentIndex {
    async fn send(
        &self,
        _watch_id: &str,
        _action_id: &str,
        action: &RenderedAction,
    ) -> Result<Value, ChannelError> {
        let RenderedAction::Index {
            index,
            doc_id,
            document,
        } = action
        else {
            return Err(ChannelError::Rejected(format!(
                "index channel cannot send {} actions",
                action.action_type()
            )));
        };

        let id = self
            .put(index, doc_id.as_deref(), document)
            .map_err(|e| ChannelError::Request(e.to_string()))?;
        Ok(json!({ "index": index, "id": id, "result": "created" }))
    }
}

#[async_trait]
impl DataSource for DocumentIndex {
    async fn query(&self, query: &Query, _timeout: Duration) -> Result<Value, SourceError> {
        match query {
            Query::Search { indices, body } => self.search(indices, body),
            Query::Http { .. } => Err(SourceError::Unsupported("http")),
        }
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
