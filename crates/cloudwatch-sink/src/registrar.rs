// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One-time setup of the remote log group and stream.

use crate::client::{
    CreateLogGroupInput, CreateLogStreamInput, DescribeLogGroupsInput, DescribeLogStreamsInput,
    LogsClient,
};
use crate::config::StreamIdentity;
use crate::error::SinkError;
use crate::writer::SequenceToken;
use tracing::debug;

/// Makes sure the group and stream exist and returns the stream's current
/// upload sequence token.
///
/// `None` is returned for a freshly created stream and for an existing stream
/// that has never been written to. Any remote error aborts the setup.
///
/// Listings are queried by prefix, but only an exact name match counts as
/// existing: a stream `s` never resumes the token of `s-old`.
pub async fn ensure(
    client: &dyn LogsClient,
    identity: &StreamIdentity,
) -> Result<Option<SequenceToken>, SinkError> {
    let group = &identity.group_name;
    let stream = &identity.stream_name;

    // Groups come back sorted by name, so an exact match sorts first.
    let groups = client
        .describe_log_groups(DescribeLogGroupsInput {
            log_group_name_prefix: Some(group.clone()),
            limit: Some(1),
        })
        .await
        .map_err(|source| SinkError::DescribeLogGroups {
            group: group.clone(),
            source,
        })?;

    if groups.log_groups.iter().any(|g| &g.log_group_name == group) {
        debug!("Log group {} already exists", group);
    } else {
        debug!("Creating log group {}", group);
        client
            .create_log_group(CreateLogGroupInput {
                log_group_name: group.clone(),
            })
            .await
            .map_err(|source| SinkError::CreateLogGroup {
                group: group.clone(),
                source,
            })?;
    }

    let streams = client
        .describe_log_streams(DescribeLogStreamsInput {
            log_group_name: group.clone(),
            log_stream_name_prefix: Some(stream.clone()),
            limit: None,
        })
        .await
        .map_err(|source| SinkError::DescribeLogStreams {
            group: group.clone(),
            stream: stream.clone(),
            source,
        })?;

    if let Some(existing) = streams
        .log_streams
        .into_iter()
        .find(|s| &s.log_stream_name == stream)
    {
        debug!(
            "Log stream {}/{} already exists, resuming from {:?}",
            group, stream, existing.upload_sequence_token
        );
        return Ok(existing.upload_sequence_token.map(SequenceToken::from));
    }

    debug!("Creating log stream {}/{}", group, stream);
    client
        .create_log_stream(CreateLogStreamInput {
            log_group_name: group.clone(),
            log_stream_name: stream.clone(),
        })
        .await
        .map_err(|source| SinkError::CreateLogStream {
            group: group.clone(),
            stream: stream.clone(),
            source,
        })?;

    Ok(None)
}
