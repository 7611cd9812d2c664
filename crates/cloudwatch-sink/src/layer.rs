// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! `tracing-subscriber` integration.
//!
//! ```rust,ignore
//! use tracing_subscriber::prelude::*;
//!
//! let sink = Arc::new(CloudwatchSink::new(params).await?);
//! let layer = CloudwatchLayer::new(sink, tokio::runtime::Handle::current());
//! let shutdown = layer.clone();
//! tracing_subscriber::registry().with(layer).init();
//! // ...
//! shutdown.flush().await?;
//! ```
//!
//! Events are queued on a bounded channel and handed to the sink one at a time
//! by a single worker task, so the calling thread never waits on the network
//! and events reach the stream in the order they were emitted. The sink's
//! dispatch mode applies inside the worker.

use crate::level::Level;
use crate::record::{Field, FieldValue, LogRecord};
use crate::sink::CloudwatchSink;
use std::fmt::Debug;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const EVENT_CHANNEL_BUFFER_SIZE: usize = 1024;

// Events from these targets are produced while shipping and would loop back
// into the sink.
const INTERNAL_TARGETS: [&str; 7] = [
    "cloudwatch_sink",
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
    "tokio",
];

enum Command {
    Ship(LogRecord, Vec<Field>),
    /// Acknowledged once every earlier command has been handled.
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct CloudwatchLayer {
    sink: Arc<CloudwatchSink>,
    tx: Sender<Command>,
    failed: Arc<AtomicU64>,
}

impl CloudwatchLayer {
    /// Spawns the worker that feeds `sink` onto `runtime`. The worker stops
    /// when the layer and all its clones are dropped.
    pub fn new(sink: Arc<CloudwatchSink>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);
        let failed = Arc::new(AtomicU64::new(0));
        runtime.spawn(run_worker(Arc::clone(&sink), rx, Arc::clone(&failed)));

        CloudwatchLayer { sink, tx, failed }
    }

    /// Number of events the sink failed to encode or ship, plus events dropped
    /// because the queue was full.
    pub fn failed_events(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Waits until every event queued before this call has been handed to the
    /// sink, then flushes the sink's output.
    pub async fn flush(&self) -> io::Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let stopped = || io::Error::new(io::ErrorKind::BrokenPipe, "log worker stopped");
        self.tx
            .send(Command::Flush(ack_tx))
            .await
            .map_err(|_| stopped())?;
        ack_rx.await.map_err(|_| stopped())?;
        self.sink.flush()
    }
}

async fn run_worker(
    sink: Arc<CloudwatchSink>,
    mut rx: Receiver<Command>,
    failed: Arc<AtomicU64>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Ship(record, fields) => {
                if sink.handle(&record, &fields).await.is_err() {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

fn is_internal(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<S: Subscriber> Layer<S> for CloudwatchLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }
        let level = Level::from(metadata.level());
        if !self.sink.should_handle(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let record = LogRecord {
            level,
            timestamp: SystemTime::now(),
            message: visitor.message,
            target: Some(metadata.target().to_string()),
        };

        if self.tx.try_send(Command::Ship(record, visitor.fields)).is_err() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<Field>,
}

impl FieldVisitor {
    fn push(&mut self, field: &TracingField, value: FieldValue) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, FieldValue::F64(value));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, FieldValue::U64(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        self.push(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn Debug) {
        self.push(field, FieldValue::Str(format!("{value:?}")));
    }
}
