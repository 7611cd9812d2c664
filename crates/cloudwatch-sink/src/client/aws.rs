// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`LogsClient`] over `aws-sdk-cloudwatchlogs`.
//!
//! Region and credentials are resolved the standard AWS way (environment,
//! shared config files, container or instance role) and every request is
//! signed by the SDK.

use super::{
    ClientError, CreateLogGroupInput, CreateLogStreamInput, DescribeLogGroupsInput,
    DescribeLogGroupsOutput, DescribeLogStreamsInput, DescribeLogStreamsOutput, LogGroup,
    LogStream, LogsClient, PutLogEventsInput, PutLogEventsOutput, RejectedLogEventsInfo,
};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::types;
use std::env;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SdkLogsClient {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl SdkLogsClient {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        SdkLogsClient { client }
    }

    /// Build a client from the ambient AWS environment.
    ///
    /// `CLOUDWATCH_ENDPOINT` overrides the service endpoint, e.g. for a local
    /// emulator.
    pub async fn from_env() -> Self {
        let cfg = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let mut builder = aws_sdk_cloudwatchlogs::config::Builder::from(&cfg);
        if let Ok(url) = env::var("CLOUDWATCH_ENDPOINT") {
            debug!("Using CloudWatch Logs endpoint override {}", url);
            builder = builder.endpoint_url(url);
        }

        Self::new(aws_sdk_cloudwatchlogs::Client::from_conf(builder.build()))
    }
}

/// Typed service errors keep their code; everything else (dispatch, timeout,
/// unparseable response) is flattened into [`ClientError::Sdk`].
fn client_error<E>(err: SdkError<E>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if let SdkError::ServiceError(ref service) = err {
        if let Some(code) = service.err().code() {
            return ClientError::Service {
                code: code.to_string(),
                message: service.err().message().unwrap_or_default().to_string(),
            };
        }
    }
    ClientError::Sdk(DisplayErrorContext(&err).to_string())
}

fn limit(limit: Option<u32>) -> Option<i32> {
    limit.map(|limit| i32::try_from(limit).unwrap_or(i32::MAX))
}

#[allow(deprecated)]
fn log_stream(stream: &types::LogStream) -> LogStream {
    LogStream {
        log_stream_name: stream.log_stream_name().unwrap_or_default().to_string(),
        upload_sequence_token: stream.upload_sequence_token().map(str::to_string),
    }
}

fn rejected_info(info: &types::RejectedLogEventsInfo) -> RejectedLogEventsInfo {
    RejectedLogEventsInfo {
        too_new_log_event_start_index: info.too_new_log_event_start_index().map(i64::from),
        too_old_log_event_end_index: info.too_old_log_event_end_index().map(i64::from),
        expired_log_event_end_index: info.expired_log_event_end_index().map(i64::from),
    }
}

#[async_trait]
impl LogsClient for SdkLogsClient {
    async fn describe_log_groups(
        &self,
        input: DescribeLogGroupsInput,
    ) -> Result<DescribeLogGroupsOutput, ClientError> {
        let output = self
            .client
            .describe_log_groups()
            .set_log_group_name_prefix(input.log_group_name_prefix)
            .set_limit(limit(input.limit))
            .send()
            .await
            .map_err(client_error)?;

        Ok(DescribeLogGroupsOutput {
            log_groups: output
                .log_groups()
                .iter()
                .map(|group| LogGroup {
                    log_group_name: group.log_group_name().unwrap_or_default().to_string(),
                    arn: group.arn().map(str::to_string),
                    creation_time: group.creation_time(),
                })
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_log_group(&self, input: CreateLogGroupInput) -> Result<(), ClientError> {
        self.client
            .create_log_group()
            .log_group_name(input.log_group_name)
            .send()
            .await
            .map_err(client_error)?;
        Ok(())
    }

    async fn describe_log_streams(
        &self,
        input: DescribeLogStreamsInput,
    ) -> Result<DescribeLogStreamsOutput, ClientError> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(input.log_group_name)
            .set_log_stream_name_prefix(input.log_stream_name_prefix)
            .set_limit(limit(input.limit))
            .send()
            .await
            .map_err(client_error)?;

        Ok(DescribeLogStreamsOutput {
            log_streams: output.log_streams().iter().map(log_stream).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_log_stream(&self, input: CreateLogStreamInput) -> Result<(), ClientError> {
        self.client
            .create_log_stream()
            .log_group_name(input.log_group_name)
            .log_stream_name(input.log_stream_name)
            .send()
            .await
            .map_err(client_error)?;
        Ok(())
    }

    #[allow(deprecated)]
    async fn put_log_events(
        &self,
        input: PutLogEventsInput,
    ) -> Result<PutLogEventsOutput, ClientError> {
        let events = input
            .log_events
            .into_iter()
            .map(|event| {
                types::InputLogEvent::builder()
                    .timestamp(event.timestamp)
                    .message(event.message)
                    .build()
                    .map_err(|e| ClientError::Sdk(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .put_log_events()
            .log_group_name(input.log_group_name)
            .log_stream_name(input.log_stream_name)
            .set_log_events(Some(events))
            .set_sequence_token(input.sequence_token)
            .send()
            .await
            .map_err(client_error)?;

        Ok(PutLogEventsOutput {
            next_sequence_token: output.next_sequence_token().map(str::to_string),
            rejected_log_events_info: output.rejected_log_events_info().map(rejected_info),
        })
    }
}
