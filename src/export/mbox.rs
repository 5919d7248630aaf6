//! Serialize decoded messages into mbox entries and append them to a file.
//!
//! Each entry is laid out as:
//!
//! ```text
//! From <sender> <Www Mmm dd hh:mm:ss yyyy>\n
//! <message bytes, with "From " lines escaped to ">From ">
//! \n            (only if the message does not already end with one)
//! \n            (blank separator line)
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::model::message::DecodedMessage;
use crate::parser::header::Envelope;

/// Marker that starts every entry and must not start any other line.
const SEPARATOR: &[u8] = b"From ";

/// One serialized message, ready to be appended to an mbox file.
#[derive(Debug, Clone)]
pub struct MboxEntry {
    pub envelope: Envelope,
    bytes: Vec<u8>,
}

impl MboxEntry {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Turns decoded messages into [`MboxEntry`] records.
#[derive(Debug, Clone, Copy)]
pub struct MboxEncoder {
    date_prefix_len: usize,
}

impl Default for MboxEncoder {
    fn default() -> Self {
        Self::new(31)
    }
}

impl MboxEncoder {
    /// `date_prefix_len` bounds how much of a `Date:` value is parsed.
    pub fn new(date_prefix_len: usize) -> Self {
        Self { date_prefix_len }
    }

    /// Encode one message. Never fails; `now` stands in for a missing date.
    pub fn encode(&self, message: &DecodedMessage<'_>, now: NaiveDateTime) -> MboxEntry {
        let envelope = Envelope::from_headers(message.header_block(), now, self.date_prefix_len);
        let line = envelope_line(&envelope);
        let escaped = escape_from_lines(message.as_bytes());

        let mut bytes = Vec::with_capacity(line.len() + escaped.len() + 2);
        bytes.extend_from_slice(line.as_bytes());
        bytes.extend_from_slice(&escaped);
        if !escaped.ends_with(b"\n") {
            bytes.push(b'\n');
        }
        bytes.push(b'\n');

        MboxEntry { envelope, bytes }
    }
}

/// Build the `From ` separator line for an envelope, including its `\n`.
pub fn envelope_line(envelope: &Envelope) -> String {
    format!("From {} {}\n", envelope.sender, envelope.rendered_date())
}

/// Prefix every line starting with `From ` with `>`.
///
/// Lines are split on `\n`; everything else, including `\r`, is left as is.
/// Lines that are already quoted (`>From `) are not touched, so a second pass
/// never creates a new `From ` line.
pub fn escape_from_lines(content: &[u8]) -> Cow<'_, [u8]> {
    if !needs_escaping(content) {
        return Cow::Borrowed(content);
    }

    let mut out = Vec::with_capacity(content.len() + 16);
    for (i, line) in content.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        if line.starts_with(SEPARATOR) {
            out.push(b'>');
        }
        out.extend_from_slice(line);
    }
    Cow::Owned(out)
}

fn needs_escaping(content: &[u8]) -> bool {
    content
        .split(|&b| b == b'\n')
        .any(|line| line.starts_with(SEPARATOR))
}

/// Appends entries to one mbox file, creating it on the first entry.
///
/// A writer that never receives an entry leaves no file behind, and removes
/// a stale file of the same name from an earlier run.
pub struct MboxWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    entries: u64,
    bytes_written: u64,
}

impl MboxWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            entries: 0,
            bytes_written: 0,
        }
    }

    pub fn append(&mut self, entry: &MboxEntry) -> Result<()> {
        let file = match self.file {
            Some(ref mut file) => file,
            None => {
                let created =
                    File::create(&self.path).map_err(|e| ExportError::io(&self.path, e))?;
                self.file.insert(BufWriter::new(created))
            }
        };

        file.write_all(entry.as_bytes())
            .map_err(|e| ExportError::io(&self.path, e))?;
        self.entries += 1;
        self.bytes_written += entry.as_bytes().len() as u64;
        Ok(())
    }

    /// Flush and close the file. Returns the number of entries written.
    pub fn finish(self) -> Result<u64> {
        match self.file {
            Some(mut file) => {
                file.flush().map_err(|e| ExportError::io(&self.path, e))?;
                debug!(
                    path = %self.path.display(),
                    entries = self.entries,
                    bytes = self.bytes_written,
                    "Closed mbox"
                );
            }
            None => {
                if self.path.exists() {
                    std::fs::remove_file(&self.path)
                        .map_err(|e| ExportError::io(&self.path, e))?;
                    debug!(path = %self.path.display(), "Removed stale empty mbox");
                }
            }
        }
        Ok(self.entries)
    }

    /// Drop whatever was written so far and delete the file.
    pub fn abort(self) {
        let created = self.file.is_some();
        drop(self.file);
        if created {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not remove partial mbox"
                );
            }
        }
    }
}
