//! Decoder for Apple Mail `.emlx` message containers.
//!
//! An `.emlx` file is laid out as:
//!
//! 1. a line holding the byte length of the message, in ASCII decimal,
//! 2. the RFC 5322 message itself,
//! 3. an XML property list with Mail.app metadata (flags, dates, …).
//!
//! Only the message is extracted; the property list is never interpreted.

use std::path::Path;

use tracing::debug;

use crate::error::{DecodeFailure, ExportError, Result};
use crate::model::message::DecodedMessage;

/// Outcome of reading the first line of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// A non-negative byte count of the message that follows.
    Declared(usize),
    /// Not an ASCII integer; the message runs to the end of the file.
    Unparseable,
}

/// Parse the length line (without its terminator).
pub fn parse_length_field(line: &[u8]) -> LengthField {
    std::str::from_utf8(line.trim_ascii())
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .map_or(LengthField::Unparseable, LengthField::Declared)
}

/// Extract the message from the full bytes of one container.
///
/// A declared length longer than what follows is clamped to the end of the
/// input. An unparseable length means everything after the first line.
pub fn decode(raw: &[u8]) -> std::result::Result<DecodedMessage<'_>, DecodeFailure> {
    let newline = raw
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(DecodeFailure::MissingTerminator)?;

    let start = newline + 1;
    let rest = &raw[start..];

    let content = match parse_length_field(&raw[..newline]) {
        LengthField::Declared(len) => {
            if len > rest.len() {
                debug!(
                    declared = len,
                    available = rest.len(),
                    "Declared length exceeds container, clamping"
                );
            }
            &rest[..len.min(rest.len())]
        }
        LengthField::Unparseable => {
            debug!("Unparseable length prefix, taking the rest of the container");
            rest
        }
    };

    if content.is_empty() {
        return Err(DecodeFailure::EmptyMessage);
    }

    Ok(DecodedMessage::new(content))
}

/// Read a whole container from disk.
///
/// Decoding is left to the caller so the returned buffer can back the
/// borrowed [`DecodedMessage`].
pub fn read_container(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| ExportError::from_io(path, e))
}

/// Read and decode one container, returning an owned copy of the message bytes.
pub fn read_message(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let raw = read_container(path)?;
    let message = decode(&raw).map_err(|reason| ExportError::Decode {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(message.as_bytes().to_vec())
}
