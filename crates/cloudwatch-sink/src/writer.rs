// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Serialised remote writes and the shared sequence token.
//!
//! Each write holds the [`TokenCell`] lock across the whole
//! read-token / `PutLogEvents` / store-token sequence, so the token attached to
//! a call is always the one returned by the previous successful call. Clones of
//! a [`SequencedWriter`] share one cell because they target the same stream.
//!
//! Fire-and-forget writes go through a bounded queue drained by a single
//! background task, so events reach the stream in the order they were written.

use crate::client::{InputLogEvent, LogsClient, PutLogEventsInput};
use crate::config::{DispatchMode, StreamIdentity};
use crate::error::SinkError;
use crate::level::{Level, LevelFilter};
use crate::record::now_millis;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

const BACKGROUND_QUEUE_SIZE: usize = 1024;

/// Opaque token the service requires on the next write to a stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceToken(String);

impl SequenceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SequenceToken {
    fn from(token: String) -> Self {
        SequenceToken(token)
    }
}

impl From<&str> for SequenceToken {
    fn from(token: &str) -> Self {
        SequenceToken(token.to_string())
    }
}

impl From<SequenceToken> for String {
    fn from(token: SequenceToken) -> Self {
        token.0
    }
}

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single authoritative copy of a stream's sequence token.
#[derive(Debug, Default)]
pub struct TokenCell {
    token: Mutex<Option<SequenceToken>>,
}

impl TokenCell {
    pub fn new(initial: Option<SequenceToken>) -> Self {
        TokenCell {
            token: Mutex::new(initial),
        }
    }

    /// Snapshot of the stored token. Waits for an in-flight write to finish.
    pub async fn current(&self) -> Option<SequenceToken> {
        self.token.lock().await.clone()
    }

    /// Exclusive access to the token for the duration of one remote write.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<SequenceToken>> {
        self.token.lock().await
    }
}

/// The remote stream together with its token.
#[derive(Clone)]
struct StreamTarget {
    client: Arc<dyn LogsClient>,
    identity: Arc<StreamIdentity>,
    token: Arc<TokenCell>,
}

impl StreamTarget {
    async fn put(&self, event: InputLogEvent) -> Result<(), SinkError> {
        let mut token = self.token.lock().await;

        let input = PutLogEventsInput {
            log_group_name: self.identity.group_name.clone(),
            log_stream_name: self.identity.stream_name.clone(),
            log_events: vec![event],
            sequence_token: token.clone().map(String::from),
        };

        let output = self.client.put_log_events(input).await?;
        if let Some(rejected) = &output.rejected_log_events_info {
            warn!("Log event rejected by {}: {:?}", self.path(), rejected);
        }
        *token = output.next_sequence_token.map(SequenceToken::from);
        Ok(())
    }

    async fn drain(self, mut rx: Receiver<InputLogEvent>) {
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.put(event).await {
                debug!("Dropped log event for {}: {}", self.path(), e);
            }
        }
        debug!("Background writer for {} stopped", self.path());
    }

    fn path(&self) -> String {
        format!(
            "{}/{}",
            self.identity.group_name, self.identity.stream_name
        )
    }
}

#[derive(Clone)]
pub struct SequencedWriter {
    target: StreamTarget,
    filter: LevelFilter,
    dispatch: DispatchMode,
    // Only set under `DispatchMode::FireAndForget`.
    background: Option<Sender<InputLogEvent>>,
}

impl SequencedWriter {
    /// Under [`DispatchMode::FireAndForget`] the background writer task is
    /// spawned onto `runtime` and lives until the last clone is dropped.
    pub fn new(
        client: Arc<dyn LogsClient>,
        identity: StreamIdentity,
        filter: LevelFilter,
        dispatch: DispatchMode,
        initial_token: Option<SequenceToken>,
        runtime: &Handle,
    ) -> Self {
        let target = StreamTarget {
            client,
            identity: Arc::new(identity),
            token: Arc::new(TokenCell::new(initial_token)),
        };

        let background = match dispatch {
            DispatchMode::Sync => None,
            DispatchMode::FireAndForget => {
                let (tx, rx) = mpsc::channel(BACKGROUND_QUEUE_SIZE);
                runtime.spawn(target.clone().drain(rx));
                Some(tx)
            }
        };

        SequencedWriter {
            target,
            filter,
            dispatch,
            background,
        }
    }

    pub fn identity(&self) -> &StreamIdentity {
        &self.target.identity
    }

    pub fn filter(&self) -> &LevelFilter {
        &self.filter
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch
    }

    pub fn token_cell(&self) -> &Arc<TokenCell> {
        &self.target.token
    }

    /// Ships one message as a single-event `PutLogEvents` call.
    ///
    /// Levels rejected by the filter are a successful no-op. Under
    /// [`DispatchMode::FireAndForget`] this returns `Ok` once the event is
    /// queued; the remote outcome is only logged, and events that do not fit
    /// in the queue are dropped.
    pub async fn write(&self, level: Level, message: String) -> Result<(), SinkError> {
        if !self.filter.accepts(level) {
            return Ok(());
        }

        let event = InputLogEvent {
            message,
            timestamp: now_millis(),
        };

        match &self.background {
            None => self.target.put(event).await,
            Some(queue) => {
                if let Err(e) = queue.try_send(event) {
                    debug!("Dropped log event for {}: {}", self.target.path(), e);
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for SequencedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencedWriter")
            .field("identity", &self.target.identity)
            .field("filter", &self.filter)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}
