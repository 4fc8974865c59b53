//! Error types

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where a binding record came from, for error messages.
///
/// `index` is the record's position in the loaded sequence; `line` is set
/// when the record was read from a line-oriented file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub index: usize,
    pub line: Option<usize>,
}

impl Location {
    pub fn record(index: usize) -> Self {
        Self { index, line: None }
    }

    pub fn line(index: usize, line: usize) -> Self {
        Self {
            index,
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}"),
            None => write!(f, "binding #{}", self.index + 1),
        }
    }
}

/// Errors while loading configuration or building a keymap
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{at}: {message}")]
    Syntax { at: Location, message: String },

    #[error("{at}: unknown name \"{name}\"")]
    UnknownName { at: Location, name: String },

    #[error("{at}: missing {field}")]
    MissingField { at: Location, field: &'static str },

    #[error("{at}: input key {key} out of range (max {max})")]
    KeyOutOfRange { at: Location, key: u32, max: usize },

    #[error("{at}: unrecognized output kind {kind}")]
    UnknownKind { at: Location, kind: u16 },

    #[error("{at}: output code {code} out of range for {kind}")]
    OutputOutOfRange {
        at: Location,
        kind: &'static str,
        code: u32,
    },

    #[error("{at}: invalid value {value}: {reason}")]
    InvalidValue {
        at: Location,
        value: i64,
        reason: &'static str,
    },

    #[error("{at}: key {key} is already bound at {first}")]
    DuplicateKey {
        at: Location,
        key: u16,
        first: Location,
    },

    #[error(
        "{at}: keys {first} and {second} share axis {axis} but are not opposites \
         (values {first_value} and {second_value})"
    )]
    BadAxisPair {
        at: Location,
        axis: u16,
        first: u16,
        second: u16,
        first_value: i32,
        second_value: i32,
    },

    #[error("{at}: axis {axis} is already bound to keys {keys:?}; at most two keys may share an axis")]
    AxisOverbound {
        at: Location,
        axis: u16,
        keys: Vec<u16>,
    },

    #[error("no bindings configured")]
    Empty,
}

/// Errors from the output device
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create virtual device: {0}")]
    Create(#[source] std::io::Error),

    #[error("Failed to emit event: {0}")]
    Write(#[source] std::io::Error),
}

/// Errors from the input device
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to grab input device: {0}")]
    Grab(#[source] std::io::Error),

    #[error("Failed to read input: {0}")]
    Read(#[source] std::io::Error),

    #[error("Input ended mid-event ({len} trailing bytes)")]
    Truncated { len: usize },
}

/// Errors that stop the translation loop
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
