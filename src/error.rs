//! Centralized error types for emlx2mbox.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the emlx2mbox library.
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file or directory does not exist.
    #[error("Path not found: {0}")]
    FileNotFound(PathBuf),

    /// A directory was expected but something else was found.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A message container could not be decoded.
    #[error("Cannot decode '{path}': {reason}")]
    Decode {
        path: PathBuf,
        reason: DecodeFailure,
    },

    /// The configuration could not be read or written.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for `Result<T, ExportError>`.
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an `io::Error` to `FileNotFound` when appropriate, `Io` otherwise.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::io(path, source)
        }
    }
}

/// Why an `.emlx` container yielded no message.
///
/// An unparseable length prefix is *not* a failure: the decoder falls back to
/// treating everything after the first line as message content.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// No line terminator anywhere in the input, so there is no length line.
    #[error("no line terminator after length prefix")]
    MissingTerminator,
    /// The container holds zero bytes of message content.
    #[error("container holds no message content")]
    EmptyMessage,
}
