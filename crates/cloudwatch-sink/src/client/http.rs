// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`LogsClient`] over the CloudWatch Logs JSON 1.1 protocol.
//!
//! Every operation is a `POST` to the configured endpoint with the operation
//! named in `X-Amz-Target`. Requests are not signed here, so the endpoint has
//! no default: point it at a signing proxy or a local emulator, or inject the
//! authorization headers through [`HttpClientConfig::headers`]. The
//! [`super::SdkLogsClient`] talks to AWS itself.

use super::{
    ClientError, CreateLogGroupInput, CreateLogStreamInput, DescribeLogGroupsInput,
    DescribeLogGroupsOutput, DescribeLogStreamsInput, DescribeLogStreamsOutput, LogsClient,
    PutLogEventsInput, PutLogEventsOutput,
};
use crate::config::HttpClientConfig;
use crate::error::SinkError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const TARGET_PREFIX: &str = "Logs_20140328";
const CONTENT_TYPE_AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_HEADER: &str = "x-amz-target";

#[derive(Debug, Clone)]
pub struct HttpLogsClient {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

impl HttpLogsClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, SinkError> {
        let client = match build_client(config, true) {
            Ok(client) => client,
            Err(e) => {
                error!(
                    "Unable to parse proxy configuration: {}, falling back to direct connection",
                    e
                );
                build_client(config, false)
                    .map_err(|e| SinkError::InvalidConfig(format!("HTTP client: {e}")))?
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_AMZ_JSON));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SinkError::InvalidConfig(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SinkError::InvalidConfig(format!("header value for '{name}': {e}")))?;
            headers.insert(name, value);
        }

        Ok(HttpLogsClient {
            client,
            endpoint: config.endpoint.clone(),
            headers,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<I>(&self, operation: &str, input: &I) -> Result<Vec<u8>, ClientError>
    where
        I: Serialize + Sync,
    {
        let target = format!("{TARGET_PREFIX}.{operation}");
        debug!("Calling {} on {}", target, self.endpoint);

        let body = serde_json::to_vec(input).map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .header(TARGET_HEADER, target)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }
        Err(service_error(status.as_u16(), &bytes))
    }

    async fn call_decode<I, O>(&self, operation: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let bytes = self.call(operation, input).await?;
        let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn build_client(
    config: &HttpClientConfig,
    allow_proxy: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if allow_proxy {
        if let Some(https_uri) = &config.https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(https_uri.as_str())?);
        }
    }
    builder.build()
}

/// Maps a failed response onto [`ClientError`]. The `__type` field may carry a
/// namespace (`com.amazonaws.logs#InvalidSequenceTokenException`); only the
/// part after `#` is kept.
fn service_error(status: u16, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ServiceErrorBody>(body) {
        Ok(ServiceErrorBody {
            kind: Some(kind),
            message,
        }) => {
            let code = kind.rsplit('#').next().unwrap_or(kind.as_str()).to_string();
            ClientError::Service {
                code,
                message: message.unwrap_or_default(),
            }
        }
        _ => ClientError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

#[async_trait]
impl LogsClient for HttpLogsClient {
    async fn describe_log_groups(
        &self,
        input: DescribeLogGroupsInput,
    ) -> Result<DescribeLogGroupsOutput, ClientError> {
        self.call_decode("DescribeLogGroups", &input).await
    }

    async fn create_log_group(&self, input: CreateLogGroupInput) -> Result<(), ClientError> {
        self.call("CreateLogGroup", &input).await.map(|_| ())
    }

    async fn describe_log_streams(
        &self,
        input: DescribeLogStreamsInput,
    ) -> Result<DescribeLogStreamsOutput, ClientError> {
        self.call_decode("DescribeLogStreams", &input).await
    }

    async fn create_log_stream(&self, input: CreateLogStreamInput) -> Result<(), ClientError> {
        self.call("CreateLogStream", &input).await.map(|_| ())
    }

    async fn put_log_events(
        &self,
        input: PutLogEventsInput,
    ) -> Result<PutLogEventsOutput, ClientError> {
        self.call_decode("PutLogEvents", &input).await
    }
}
