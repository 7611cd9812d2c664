// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};
use std::sync::Mutex;

/// The output a sink flushes on [`crate::sink::CloudwatchSink::flush`].
pub trait Output: Send + Sync {
    fn sync(&self) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutput;

impl Output for StdoutOutput {
    fn sync(&self) -> io::Result<()> {
        io::stdout().flush()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StderrOutput;

impl Output for StderrOutput {
    fn sync(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Wraps any writer; `sync` flushes it.
#[derive(Debug)]
pub struct WriterOutput<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        WriterOutput {
            inner: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.inner
            .into_inner()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "writer lock poisoned"))
    }
}

impl<W: Write + Send> Output for WriterOutput<W> {
    fn sync(&self) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "writer lock poisoned"))?;
        writer.flush()
    }
}
