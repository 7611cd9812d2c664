// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fake collaborators for the sink

use async_trait::async_trait;
use cloudwatch_sink::client::{
    ClientError, CreateLogGroupInput, CreateLogStreamInput, DescribeLogGroupsInput,
    DescribeLogGroupsOutput, DescribeLogStreamsInput, DescribeLogStreamsOutput, LogGroup,
    LogStream, LogsClient, PutLogEventsInput, PutLogEventsOutput,
};
use cloudwatch_sink::output::Output;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    DescribeLogGroups,
    CreateLogGroup,
    DescribeLogStreams,
    CreateLogStream,
    PutLogEvents,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DescribeLogGroups(DescribeLogGroupsInput),
    CreateLogGroup(String),
    DescribeLogStreams(DescribeLogStreamsInput),
    CreateLogStream(String, String),
    PutLogEvents(PutLogEventsInput),
}

/// In-memory log service.
///
/// Successful `PutLogEvents` calls return tokens `t1, t2, ...` in call order.
/// Group and stream listings are filtered by prefix like the real service.
#[derive(Default)]
pub struct FakeLogsClient {
    groups: Mutex<Vec<String>>,
    streams: Mutex<Vec<LogStream>>,
    failing: Mutex<Vec<Op>>,
    fail_next_puts: AtomicUsize,
    fail_all_puts: AtomicBool,
    puts: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl FakeLogsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(self, name: &str) -> Self {
        self.groups.lock().unwrap().push(name.to_string());
        self
    }

    pub fn with_stream(self, name: &str, token: Option<&str>) -> Self {
        self.streams.lock().unwrap().push(LogStream {
            log_stream_name: name.to_string(),
            upload_sequence_token: token.map(str::to_string),
        });
        self
    }

    /// Every call to `op` fails with a service error.
    pub fn failing_on(self, op: Op) -> Self {
        self.failing.lock().unwrap().push(op);
        self
    }

    pub fn fail_next_puts(&self, count: usize) {
        self.fail_next_puts.store(count, Ordering::SeqCst);
    }

    pub fn fail_all_puts(&self, fail: bool) {
        self.fail_all_puts.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls()
            .iter()
            .filter(|call| call_op(call) == op)
            .count()
    }

    pub fn puts(&self) -> Vec<PutLogEventsInput> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PutLogEvents(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), ClientError> {
        let op = call_op(&call);
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn call_op(call: &Call) -> Op {
    match call {
        Call::DescribeLogGroups(_) => Op::DescribeLogGroups,
        Call::CreateLogGroup(_) => Op::CreateLogGroup,
        Call::DescribeLogStreams(_) => Op::DescribeLogStreams,
        Call::CreateLogStream(..) => Op::CreateLogStream,
        Call::PutLogEvents(_) => Op::PutLogEvents,
    }
}

pub fn unavailable() -> ClientError {
    ClientError::Service {
        code: "ServiceUnavailableException".to_string(),
        message: "try again later".to_string(),
    }
}

#[async_trait]
impl LogsClient for FakeLogsClient {
    async fn describe_log_groups(
        &self,
        input: DescribeLogGroupsInput,
    ) -> Result<DescribeLogGroupsOutput, ClientError> {
        self.record(Call::DescribeLogGroups(input.clone()))?;
        let prefix = input.log_group_name_prefix.unwrap_or_default();
        let mut names: Vec<String> = self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect();
        names.sort();
        if let Some(limit) = input.limit {
            names.truncate(limit as usize);
        }
        Ok(DescribeLogGroupsOutput {
            log_groups: names
                .into_iter()
                .map(|log_group_name| LogGroup {
                    log_group_name,
                    ..Default::default()
                })
                .collect(),
            next_token: None,
        })
    }

    async fn create_log_group(&self, input: CreateLogGroupInput) -> Result<(), ClientError> {
        self.record(Call::CreateLogGroup(input.log_group_name.clone()))?;
        self.groups.lock().unwrap().push(input.log_group_name);
        Ok(())
    }

    async fn describe_log_streams(
        &self,
        input: DescribeLogStreamsInput,
    ) -> Result<DescribeLogStreamsOutput, ClientError> {
        self.record(Call::DescribeLogStreams(input.clone()))?;
        let prefix = input.log_stream_name_prefix.unwrap_or_default();
        let mut streams: Vec<LogStream> = self
            .streams
            .lock()
            .unwrap()
            .iter()
            .filter(|stream| stream.log_stream_name.starts_with(&prefix))
            .cloned()
            .collect();
        streams.sort_by(|a, b| a.log_stream_name.cmp(&b.log_stream_name));
        Ok(DescribeLogStreamsOutput {
            log_streams: streams,
            next_token: None,
        })
    }

    async fn create_log_stream(&self, input: CreateLogStreamInput) -> Result<(), ClientError> {
        self.record(Call::CreateLogStream(
            input.log_group_name.clone(),
            input.log_stream_name.clone(),
        ))?;
        self.streams.lock().unwrap().push(LogStream {
            log_stream_name: input.log_stream_name,
            upload_sequence_token: None,
        });
        Ok(())
    }

    async fn put_log_events(
        &self,
        input: PutLogEventsInput,
    ) -> Result<PutLogEventsOutput, ClientError> {
        self.record(Call::PutLogEvents(input))?;
        // Let other writers contend for the token lock.
        tokio::task::yield_now().await;

        if self.fail_all_puts.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let pending_failures = self.fail_next_puts.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.fail_next_puts
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(unavailable());
        }

        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PutLogEventsOutput {
            next_sequence_token: Some(format!("t{n}")),
            rejected_log_events_info: None,
        })
    }
}

/// Output that counts `sync` calls and optionally fails them.
#[derive(Default)]
pub struct CountingOutput {
    syncs: AtomicUsize,
    fail: AtomicBool,
}

impl CountingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let output = Self::default();
        output.fail.store(true, Ordering::SeqCst);
        output
    }

    pub fn syncs(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

impl Output for CountingOutput {
    fn sync(&self) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"));
        }
        Ok(())
    }
}
