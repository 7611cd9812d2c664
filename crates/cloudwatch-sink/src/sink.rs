// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The per-record entry point.

use crate::client::LogsClient;
use crate::config::{DispatchMode, SinkConfig, StreamIdentity};
use crate::encoder::Encoder;
use crate::error::SinkError;
use crate::level::{Level, LevelFilter};
use crate::output::Output;
use crate::record::{Field, LogRecord};
use crate::registrar;
use crate::writer::{SequenceToken, SequencedWriter};
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// Externally supplied level gate, consulted alongside the sink's own filter
/// by both [`CloudwatchSink::should_handle`] and [`CloudwatchSink::handle`].
pub type LevelEnabler = Arc<dyn Fn(Level) -> bool + Send + Sync>;

/// A gate that lets every level through.
pub fn enable_all() -> LevelEnabler {
    Arc::new(|_| true)
}

/// Everything needed to bring up a [`CloudwatchSink`].
pub struct SinkParams {
    pub config: SinkConfig,
    pub client: Arc<dyn LogsClient>,
    pub encoder: Box<dyn Encoder>,
    pub output: Arc<dyn Output>,
    pub level_enabler: LevelEnabler,
}

/// Ships records to one remote log stream.
///
/// Sinks derived through [`CloudwatchSink::with_fields`] share the remote
/// client, the stream and its sequence token with their source; only the
/// encoder (and its context fields) is private to each instance.
pub struct CloudwatchSink {
    writer: SequencedWriter,
    encoder: Box<dyn Encoder>,
    output: Arc<dyn Output>,
    level_enabler: LevelEnabler,
    flush_level: Level,
}

impl CloudwatchSink {
    /// Validates the configuration, creates the remote group/stream if needed
    /// and recovers the stream's sequence token.
    ///
    /// Must run inside a tokio runtime; otherwise [`SinkError::Runtime`] is
    /// returned before any remote call. Nothing is returned unless every step
    /// succeeds.
    pub async fn new(params: SinkParams) -> Result<Self, SinkError> {
        let SinkParams {
            config,
            client,
            encoder,
            output,
            level_enabler,
        } = params;

        config.validate()?;
        let runtime = Handle::try_current()?;
        let identity = config.identity();
        let initial_token = registrar::ensure(client.as_ref(), &identity).await?;
        debug!(
            "Sink ready for {}/{} with token {:?}",
            identity.group_name, identity.stream_name, initial_token
        );

        let writer = SequencedWriter::new(
            client,
            identity,
            LevelFilter::new(config.min_level),
            config.dispatch,
            initial_token,
            &runtime,
        );

        Ok(CloudwatchSink {
            writer,
            encoder,
            output,
            level_enabler,
            flush_level: config.flush_level,
        })
    }

    /// Whether a record at `level` would be shipped.
    pub fn should_handle(&self, level: Level) -> bool {
        (self.level_enabler)(level) && self.writer.filter().accepts(level)
    }

    /// Encodes and ships one record.
    ///
    /// Records [`CloudwatchSink::should_handle`] rejects are dropped without
    /// error. Records at or above the configured flush level also flush the
    /// output; flush errors on that path are ignored so they cannot mask the
    /// write's own outcome.
    pub async fn handle(&self, record: &LogRecord, fields: &[Field]) -> Result<(), SinkError> {
        if !self.should_handle(record.level) {
            return Ok(());
        }
        let message = self.encoder.encode_entry(record, fields)?;
        self.writer.write(record.level, message).await?;

        if record.level >= self.flush_level {
            // The process may be about to exit.
            let _ = self.flush();
        }
        Ok(())
    }

    /// Returns a sink for the same stream whose encoder carries `fields` in
    /// addition to this sink's context.
    #[must_use]
    pub fn with_fields(&self, fields: &[Field]) -> Self {
        let mut encoder = self.encoder.clone_encoder();
        for field in fields {
            encoder.add_field(field.clone());
        }
        CloudwatchSink {
            writer: self.writer.clone(),
            encoder,
            output: Arc::clone(&self.output),
            level_enabler: Arc::clone(&self.level_enabler),
            flush_level: self.flush_level,
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        self.output.sync()
    }

    pub fn identity(&self) -> &StreamIdentity {
        self.writer.identity()
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.writer.dispatch_mode()
    }

    pub fn accepted_levels(&self) -> &'static [Level] {
        self.writer.filter().levels()
    }

    /// The stream's current sequence token, shared by every derived sink.
    pub async fn sequence_token(&self) -> Option<SequenceToken> {
        self.writer.token_cell().current().await
    }
}

impl fmt::Debug for CloudwatchSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudwatchSink")
            .field("writer", &self.writer)
            .field("flush_level", &self.flush_level)
            .finish_non_exhaustive()
    }
}
