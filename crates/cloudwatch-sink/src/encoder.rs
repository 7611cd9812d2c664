// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Encoders render a record plus its fields into the message body shipped to
//! the remote stream.
//!
//! An encoder also carries "context" fields added through
//! [`Encoder::add_field`]. Enriched sinks clone the encoder and add their
//! fields to the clone, so the source encoder never sees them.

use crate::record::{Field, LogRecord};
use serde_json::{Map, Value};
use std::fmt::Write;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("formatting failed")]
    Format,
}

impl From<std::fmt::Error> for EncodeError {
    fn from(_: std::fmt::Error) -> Self {
        EncodeError::Format
    }
}

pub trait Encoder: Send + Sync {
    /// Renders `record` with the encoder's context fields followed by `fields`.
    fn encode_entry(&self, record: &LogRecord, fields: &[Field]) -> Result<String, EncodeError>;

    /// Returns an independent copy carrying the same context fields.
    fn clone_encoder(&self) -> Box<dyn Encoder>;

    fn add_field(&mut self, field: Field);
}

/// Renders each record as one JSON object.
///
/// ```text
/// {"level":"info","ts":1656581409123,"target":"app","msg":"started","port":8080}
/// ```
///
/// Keys are emitted in insertion order; a call-site field overrides a context
/// field with the same key.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    context: Vec<Field>,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for JsonEncoder {
    fn encode_entry(&self, record: &LogRecord, fields: &[Field]) -> Result<String, EncodeError> {
        let mut object = Map::new();
        object.insert("level".to_string(), Value::from(record.level.as_str()));
        object.insert("ts".to_string(), Value::from(record.timestamp_millis()));
        if let Some(target) = &record.target {
            object.insert("target".to_string(), Value::from(target.as_str()));
        }
        object.insert("msg".to_string(), Value::from(record.message.as_str()));

        for field in self.context.iter().chain(fields) {
            object.insert(field.key.clone(), serde_json::to_value(&field.value)?);
        }

        Ok(serde_json::to_string(&Value::Object(object))?)
    }

    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone())
    }

    fn add_field(&mut self, field: Field) {
        self.context.push(field);
    }
}

/// Renders records as a single pipe-separated line.
///
/// ```text
/// INFO | app: started port=8080
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextEncoder {
    context: Vec<Field>,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for TextEncoder {
    fn encode_entry(&self, record: &LogRecord, fields: &[Field]) -> Result<String, EncodeError> {
        let mut line = String::with_capacity(record.message.len() + 32);
        write!(line, "{} | ", record.level.as_str().to_uppercase())?;
        if let Some(target) = &record.target {
            write!(line, "{target}: ")?;
        }
        line.push_str(&record.message);
        for field in self.context.iter().chain(fields) {
            write!(line, " {}={}", field.key, field.value)?;
        }
        Ok(line)
    }

    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone())
    }

    fn add_field(&mut self, field: Field) {
        self.context.push(field);
    }
}
