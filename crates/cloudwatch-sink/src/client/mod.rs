// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The remote log client capability.
//!
//! [`LogsClient`] is the seam between the sink and the log-aggregation
//! service. Request and response types follow the CloudWatch Logs JSON wire
//! shapes so the HTTP implementation can serialise them directly; fakes used
//! in tests implement the same trait.
//!
//! [`SdkLogsClient`] (feature `aws-sdk`, on by default) talks to AWS through
//! the official SDK. [`HttpLogsClient`] speaks the same protocol unsigned, for
//! local emulators and signing proxies.

#[cfg(feature = "aws-sdk")]
pub mod aws;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "aws-sdk")]
pub use aws::SdkLogsClient;
pub use http::HttpLogsClient;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the call with a typed error, e.g.
    /// `InvalidSequenceTokenException` or `ResourceAlreadyExistsException`.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Request construction, dispatch or response handling failed inside the
    /// AWS SDK.
    #[error("AWS SDK error: {0}")]
    Sdk(String),
}

impl ClientError {
    pub fn service_code(&self) -> Option<&str> {
        match self {
            ClientError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// A write was issued with a token that is not the stream's current one.
    pub fn is_invalid_sequence_token(&self) -> bool {
        matches!(
            self.service_code(),
            Some("InvalidSequenceTokenException" | "DataAlreadyAcceptedException")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogGroupsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_group_name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    pub log_group_name: String,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub creation_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogGroupsOutput {
    #[serde(default)]
    pub log_groups: Vec<LogGroup>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogGroupInput {
    pub log_group_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsInput {
    pub log_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_stream_name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStream {
    pub log_stream_name: String,
    /// Absent until the stream has been written to.
    #[serde(default)]
    pub upload_sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsOutput {
    #[serde(default)]
    pub log_streams: Vec<LogStream>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogStreamInput {
    pub log_group_name: String,
    pub log_stream_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputLogEvent {
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsInput {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub log_events: Vec<InputLogEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedLogEventsInfo {
    #[serde(default)]
    pub too_new_log_event_start_index: Option<i64>,
    #[serde(default)]
    pub too_old_log_event_end_index: Option<i64>,
    #[serde(default)]
    pub expired_log_event_end_index: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsOutput {
    #[serde(default)]
    pub next_sequence_token: Option<String>,
    #[serde(default)]
    pub rejected_log_events_info: Option<RejectedLogEventsInfo>,
}

#[async_trait]
pub trait LogsClient: Send + Sync {
    async fn describe_log_groups(
        &self,
        input: DescribeLogGroupsInput,
    ) -> Result<DescribeLogGroupsOutput, ClientError>;

    async fn create_log_group(&self, input: CreateLogGroupInput) -> Result<(), ClientError>;

    async fn describe_log_streams(
        &self,
        input: DescribeLogStreamsInput,
    ) -> Result<DescribeLogStreamsOutput, ClientError>;

    async fn create_log_stream(&self, input: CreateLogStreamInput) -> Result<(), ClientError>;

    /// Submits a batch of events, returning the token the next write must carry.
    async fn put_log_events(
        &self,
        input: PutLogEventsInput,
    ) -> Result<PutLogEventsOutput, ClientError>;
}
