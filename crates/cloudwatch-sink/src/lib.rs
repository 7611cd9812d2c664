// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # CloudWatch Sink
//!
//! A log sink that ships structured records to a single CloudWatch Logs stream.
//!
//! ## Overview
//!
//! The sink is the unit a logging framework invokes once per record. It renders
//! the record through a pluggable [`encoder::Encoder`], submits it to the remote
//! stream with exactly one `PutLogEvents` call, and keeps the stream's upload
//! sequence token current between calls.
//!
//! ## Architecture
//!
//! - [`level`]: severity enumeration and the threshold filter
//! - [`registrar`]: creates the log group/stream if needed and recovers the token
//! - [`writer`]: serialises remote writes and advances the shared sequence token
//! - [`sink`]: the per-record entry point (`handle`, `with_fields`, `flush`)
//! - [`client`]: the remote log client capability, with AWS SDK and HTTP
//!   implementations
//! - [`layer`]: `tracing-subscriber` integration, fed through an ordered queue
//!
//! ## Delivery guarantees
//!
//! With [`config::DispatchMode::Sync`] every `handle` call awaits the remote write and
//! reports its outcome. With [`config::DispatchMode::FireAndForget`] the write is
//! queued for a background task that ships events in order: delivery is
//! at-most-once and failures are not observable by the caller.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod layer;
pub mod level;
pub mod output;
pub mod record;
pub mod registrar;
pub mod sink;
pub mod writer;

pub use config::{DispatchMode, SinkConfig};
pub use error::SinkError;
pub use level::{Level, LevelFilter, LevelSet};
pub use record::{Field, FieldValue, LogRecord};
pub use sink::{CloudwatchSink, SinkParams};
