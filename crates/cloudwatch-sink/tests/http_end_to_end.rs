// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use cloudwatch_sink::client::HttpLogsClient;
use cloudwatch_sink::config::HttpClientConfig;
use cloudwatch_sink::encoder::TextEncoder;
use cloudwatch_sink::output::StdoutOutput;
use cloudwatch_sink::sink::enable_all;
use cloudwatch_sink::{CloudwatchSink, Level, LogRecord, SinkConfig, SinkError, SinkParams};
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;

fn target(operation: &str) -> String {
    format!("Logs_20140328.{operation}")
}

async fn sink_for(server: &Server) -> Result<CloudwatchSink, SinkError> {
    let client = HttpLogsClient::new(&HttpClientConfig {
        timeout: Duration::from_secs(5),
        ..HttpClientConfig::new(server.url())
    })?;

    CloudwatchSink::new(SinkParams {
        config: SinkConfig::new("app", "web-1"),
        client: Arc::new(client),
        encoder: Box::new(TextEncoder::new()),
        output: Arc::new(StdoutOutput),
        level_enabler: enable_all(),
    })
    .await
}

#[tokio::test]
async fn sink_ships_over_http_with_sequence_tokens() {
    let mut server = Server::new_async().await;

    let describe_groups = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("DescribeLogGroups").as_str())
        .match_body(Matcher::Json(serde_json::json!({
            "logGroupNamePrefix": "app",
            "limit": 1
        })))
        .with_body(r#"{"logGroups":[{"logGroupName":"app"}]}"#)
        .expect(1)
        .create_async()
        .await;
    let create_group = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("CreateLogGroup").as_str())
        .expect(0)
        .create_async()
        .await;
    let describe_streams = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("DescribeLogStreams").as_str())
        .with_body(r#"{"logStreams":[{"logStreamName":"web-1","uploadSequenceToken":"t0"}]}"#)
        .expect(1)
        .create_async()
        .await;
    let first_put = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("PutLogEvents").as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""logGroupName":"app""#.to_string()),
            Matcher::Regex(r#""logStreamName":"web-1""#.to_string()),
            Matcher::Regex(r#""message":"INFO \| ready""#.to_string()),
            Matcher::Regex(r#""sequenceToken":"t0""#.to_string()),
        ]))
        .with_body(r#"{"nextSequenceToken":"t1"}"#)
        .expect(1)
        .create_async()
        .await;
    let second_put = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("PutLogEvents").as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""message":"WARN \| slow""#.to_string()),
            Matcher::Regex(r#""sequenceToken":"t1""#.to_string()),
        ]))
        .with_body(r#"{"nextSequenceToken":"t2"}"#)
        .expect(1)
        .create_async()
        .await;

    let sink = sink_for(&server).await.expect("sink should initialize");
    assert_eq!(sink.sequence_token().await, Some("t0".into()));

    sink.handle(&LogRecord::new(Level::Info, "ready"), &[])
        .await
        .expect("first write should succeed");
    sink.handle(&LogRecord::new(Level::Warn, "slow"), &[])
        .await
        .expect("second write should succeed");

    describe_groups.assert_async().await;
    create_group.assert_async().await;
    describe_streams.assert_async().await;
    first_put.assert_async().await;
    second_put.assert_async().await;
    assert_eq!(sink.sequence_token().await, Some("t2".into()));
}

#[tokio::test]
async fn stale_token_is_surfaced_not_retried() {
    let mut server = Server::new_async().await;

    let _groups = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("DescribeLogGroups").as_str())
        .with_body(r#"{"logGroups":[{"logGroupName":"app"}]}"#)
        .create_async()
        .await;
    let _streams = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("DescribeLogStreams").as_str())
        .with_body(r#"{"logStreams":[{"logStreamName":"web-1","uploadSequenceToken":"old"}]}"#)
        .create_async()
        .await;
    let put = server
        .mock("POST", "/")
        .match_header("x-amz-target", target("PutLogEvents").as_str())
        .with_status(400)
        .with_body(
            r#"{"__type":"InvalidSequenceTokenException","message":"The given sequenceToken is invalid","expectedSequenceToken":"new"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let sink = sink_for(&server).await.expect("sink should initialize");
    let err = sink
        .handle(&LogRecord::new(Level::Error, "lost"), &[])
        .await
        .unwrap_err();

    match err {
        SinkError::Write(client_err) => assert!(client_err.is_invalid_sequence_token()),
        other => panic!("unexpected error: {other:?}"),
    }
    put.assert_async().await;
    assert_eq!(sink.sequence_token().await, Some("old".into()));
}

#[tokio::test]
async fn unreachable_service_fails_construction() {
    // Nothing listens on the discard port.
    let client = HttpLogsClient::new(&HttpClientConfig {
        timeout: Duration::from_secs(2),
        ..HttpClientConfig::new("http://127.0.0.1:9")
    })
    .expect("client should build");

    let result = CloudwatchSink::new(SinkParams {
        config: SinkConfig::new("app", "web-1"),
        client: Arc::new(client),
        encoder: Box::new(TextEncoder::new()),
        output: Arc::new(StdoutOutput),
        level_enabler: enable_all(),
    })
    .await;

    match result {
        Err(SinkError::DescribeLogGroups { source, .. }) => {
            assert!(matches!(
                source,
                cloudwatch_sink::client::ClientError::Transport(_)
            ));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
