// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities, fakes, and helpers for integration tests

#![allow(dead_code)]

pub mod mocks;

use cloudwatch_sink::encoder::JsonEncoder;
use cloudwatch_sink::sink::enable_all;
use cloudwatch_sink::{CloudwatchSink, SinkConfig, SinkError, SinkParams};
use mocks::{CountingOutput, FakeLogsClient};
use std::sync::Arc;

/// Builds a sink over `client` with a JSON encoder and a counting output.
pub async fn build_sink(
    client: &Arc<FakeLogsClient>,
    output: &Arc<CountingOutput>,
    config: SinkConfig,
) -> Result<CloudwatchSink, SinkError> {
    CloudwatchSink::new(SinkParams {
        config,
        client: client.clone(),
        encoder: Box::new(JsonEncoder::new()),
        output: output.clone(),
        level_enabler: enable_all(),
    })
    .await
}
