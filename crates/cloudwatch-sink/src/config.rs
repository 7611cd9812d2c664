// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::SinkError;
use crate::level::Level;
use std::env;
use std::time::Duration;

const MAX_NAME_LEN: usize = 512;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How a write reaches the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// The caller awaits the remote call and receives its outcome.
    #[default]
    Sync,
    /// The event is queued for a background task; the caller always gets `Ok`.
    FireAndForget,
}

/// The (group, stream) pair a sink writes to. Fixed for the sink's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamIdentity {
    pub group_name: String,
    pub stream_name: String,
}

impl StreamIdentity {
    pub fn new(group_name: impl Into<String>, stream_name: impl Into<String>) -> Self {
        StreamIdentity {
            group_name: group_name.into(),
            stream_name: stream_name.into(),
        }
    }
}

/// Settings for a [`crate::sink::CloudwatchSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub group_name: String,
    pub stream_name: String,
    pub dispatch: DispatchMode,
    /// Records below this level are not shipped. `None` ships everything.
    pub min_level: Option<Level>,
    /// Records at or above this level force a best-effort flush of the output.
    pub flush_level: Level,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            stream_name: String::new(),
            dispatch: DispatchMode::Sync,
            min_level: None,
            flush_level: Level::Fatal,
        }
    }
}

impl SinkConfig {
    pub fn new(group_name: impl Into<String>, stream_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            stream_name: stream_name.into(),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, SinkError> {
        let group_name = env::var("CLOUDWATCH_LOG_GROUP").unwrap_or_default();
        let stream_name = env::var("CLOUDWATCH_LOG_STREAM").unwrap_or_default();
        let dispatch = match env::var("CLOUDWATCH_ASYNC") {
            Ok(val) if val.trim().eq_ignore_ascii_case("true") => DispatchMode::FireAndForget,
            _ => DispatchMode::Sync,
        };
        let min_level = env::var("CLOUDWATCH_LOG_LEVEL")
            .ok()
            .map(|val| parse_level("CLOUDWATCH_LOG_LEVEL", &val))
            .transpose()?;
        let flush_level = env::var("CLOUDWATCH_FLUSH_LEVEL")
            .ok()
            .map(|val| parse_level("CLOUDWATCH_FLUSH_LEVEL", &val))
            .transpose()?
            .unwrap_or(Level::Fatal);

        let config = Self {
            group_name,
            stream_name,
            dispatch,
            min_level,
            flush_level,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn identity(&self) -> StreamIdentity {
        StreamIdentity::new(self.group_name.clone(), self.stream_name.clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SinkError> {
        validate_group_name(&self.group_name)?;
        validate_stream_name(&self.stream_name)
    }
}

fn parse_level(var: &str, value: &str) -> Result<Level, SinkError> {
    value
        .parse()
        .map_err(|e| SinkError::InvalidConfig(format!("{var}: {e}")))
}

fn validate_group_name(name: &str) -> Result<(), SinkError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(SinkError::InvalidConfig(format!(
            "log group name must be 1-{MAX_NAME_LEN} characters, got {}",
            name.len()
        )));
    }
    if let Some(invalid) = name
        .chars()
        .find(|&ch| !ch.is_ascii_alphanumeric() && !matches!(ch, '.' | '-' | '_' | '/' | '#'))
    {
        return Err(SinkError::InvalidConfig(format!(
            "log group name '{name}' contains invalid character '{invalid}'"
        )));
    }
    Ok(())
}

fn validate_stream_name(name: &str) -> Result<(), SinkError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(SinkError::InvalidConfig(format!(
            "log stream name must be 1-{MAX_NAME_LEN} characters, got {}",
            name.len()
        )));
    }
    if name.contains(':') || name.contains('*') {
        return Err(SinkError::InvalidConfig(format!(
            "log stream name '{name}' must not contain ':' or '*'"
        )));
    }
    Ok(())
}

/// Settings for [`crate::client::HttpLogsClient`].
///
/// The HTTP client does not sign requests, so there is no default endpoint:
/// it must name a local emulator or a signing proxy. Use
/// [`crate::client::SdkLogsClient`] to talk to AWS directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Service endpoint, e.g. `http://localhost:4566`
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub https_proxy: Option<String>,
    /// Static headers added to every request
    pub headers: Vec<(String, String)>,
}

impl HttpClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            https_proxy: None,
            headers: Vec::new(),
        }
    }

    /// Create configuration from environment variables. `CLOUDWATCH_ENDPOINT`
    /// is required.
    pub fn from_env() -> Result<Self, SinkError> {
        let endpoint = env::var("CLOUDWATCH_ENDPOINT")
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| {
                SinkError::InvalidConfig("CLOUDWATCH_ENDPOINT must be set".to_string())
            })?;
        let timeout = env::var("CLOUDWATCH_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);
        let https_proxy = env::var("HTTPS_PROXY").ok();

        Ok(Self {
            endpoint,
            timeout,
            https_proxy,
            headers: Vec::new(),
        })
    }
}
