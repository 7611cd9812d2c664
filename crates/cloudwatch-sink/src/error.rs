// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::client::ClientError;
use crate::encoder::EncodeError;

/// Errors surfaced by the sink.
///
/// Construction failures (`InvalidConfig` and the per-step registration
/// variants) mean no sink was produced. `Encode` and `Write` are per-record:
/// the record is dropped and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sink was brought up outside a tokio runtime.
    #[error("No tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    #[error("Failed to describe log groups for '{group}': {source}")]
    DescribeLogGroups {
        group: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to create log group '{group}': {source}")]
    CreateLogGroup {
        group: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to describe log streams for '{group}/{stream}': {source}")]
    DescribeLogStreams {
        group: String,
        stream: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to create log stream '{group}/{stream}': {source}")]
    CreateLogStream {
        group: String,
        stream: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to encode log record: {0}")]
    Encode(#[from] EncodeError),

    #[error("Failed to put log events: {0}")]
    Write(#[from] ClientError),
}

impl SinkError {
    /// True for errors raised while bringing the sink up.
    pub fn is_init(&self) -> bool {
        !matches!(self, SinkError::Encode(_) | SinkError::Write(_))
    }
}
