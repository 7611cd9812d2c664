// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Severity levels and the threshold filter deciding which records are shipped.

use std::fmt;
use std::str::FromStr;

/// Record severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Critical,
}

impl Level {
    /// Every supported level, least severe first.
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Critical => "critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "critical" => Ok(Level::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            _ => Level::Error,
        }
    }
}

static ORDERED_LEVELS: [Level; 6] = Level::ALL;

/// Ordered set of accepted levels: a contiguous suffix of [`Level::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSet {
    levels: &'static [Level],
}

impl LevelSet {
    pub fn levels(&self) -> &'static [Level] {
        self.levels
    }

    pub fn contains(&self, level: Level) -> bool {
        self.levels.contains(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Returns every level at or above `threshold`.
pub fn level_threshold(threshold: Level) -> LevelSet {
    let start = ORDERED_LEVELS
        .iter()
        .position(|level| *level == threshold)
        .unwrap_or(ORDERED_LEVELS.len());
    LevelSet {
        levels: &ORDERED_LEVELS[start..],
    }
}

/// Decides whether a record's severity should be shipped at all.
///
/// Built once from an optional minimum level. Without a minimum every
/// severity is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelFilter {
    accepted: Option<LevelSet>,
}

impl LevelFilter {
    pub fn new(min_level: Option<Level>) -> Self {
        LevelFilter {
            accepted: min_level.map(level_threshold),
        }
    }

    /// Levels the filter lets through.
    pub fn levels(&self) -> &'static [Level] {
        match self.accepted {
            Some(set) => set.levels(),
            None => &ORDERED_LEVELS,
        }
    }

    pub fn accepts(&self, level: Level) -> bool {
        self.accepted.map_or(true, |set| set.contains(level))
    }
}
