// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::channel::FakeChannel;
use crate::source::FakeDataSource;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use wx_core::watch::LogLevel;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn logging_action() -> RenderedAction {
    RenderedAction::Logging {
        level: LogLevel::Info,
        category: None,
        text: "hello".to_string(),
    }
}

#[test]
fn traced_channel_logs_success_with_span_fields() {
    let fake = FakeChannel::new();
    let traced = TracedChannel::new(fake.clone());

    let (logs, result) = with_tracing(|| async move {
        traced.send("disk", "notify", &logging_action()).await
    });

    assert!(result.is_ok());
    assert_eq!(fake.call_count(), 1);
    assert!(logs.contains("channel.send"), "{logs}");
    assert!(logs.contains("watch_id=\"disk\""), "{logs}");
    assert!(logs.contains("action_type=\"logging\""), "{logs}");
    assert!(logs.contains("sent"), "{logs}");
    assert!(logs.contains("elapsed_ms"), "{logs}");
}

#[test]
fn traced_channel_logs_errors() {
    let fake = FakeChannel::new();
    fake.fail_all(ChannelError::Request("connection refused".to_string()));
    let traced = TracedChannel::new(fake);

    let (logs, result) = with_tracing(|| async move {
        traced.send("disk", "notify", &logging_action()).await
    });

    assert!(result.is_err());
    assert!(logs.contains("send failed"), "{logs}");
    assert!(logs.contains("connection refused"), "{logs}");
}

#[test]
fn traced_source_passes_results_through() {
    let fake = FakeDataSource::new().always(json!({ "count": 3 }));
    let traced = TracedDataSource::new(fake.clone());
    let query = Query::Search {
        indices: vec!["logs".to_string()],
        body: json!({}),
    };

    let (logs, result) = with_tracing(|| async move {
        traced.query(&query, Duration::from_secs(1)).await
    });

    assert_eq!(result.unwrap(), json!({ "count": 3 }));
    assert_eq!(fake.queries().len(), 1);
    assert!(logs.contains("source.query"), "{logs}");
    assert!(logs.contains("kind=\"search\""), "{logs}");
    assert!(logs.contains("query complete"), "{logs}");
}

#[test]
fn traced_source_logs_errors() {
    let fake = FakeDataSource::new().always_fail(SourceError::Timeout(Duration::from_secs(1)));
    let traced = TracedDataSource::new(fake);
    let query = Query::Search {
        indices: vec![],
        body: json!({}),
    };

    let (logs, result) = with_tracing(|| async move {
        traced.query(&query, Duration::from_secs(1)).await
    });

    assert!(result.is_err());
    assert!(logs.contains("query failed"), "{logs}");
    assert!(logs.contains("timed out"), "{logs}");
}
