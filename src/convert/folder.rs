//! Convert one mailbox folder into one mbox file.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::warn;

use crate::convert::discover;
use crate::convert::ConvertOptions;
use crate::error::Result;
use crate::export::mbox::MboxWriter;
use crate::parser::emlx;

/// Per-folder message counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FolderStats {
    /// Messages written to the mbox file.
    pub converted: u64,
    /// Containers that could not be read or decoded.
    pub skipped: u64,
}

/// Convert every message container below `source_dir` into `mbox_path`.
///
/// Containers are processed in sorted path order, so the output is
/// byte-identical across runs over the same input. Unreadable or malformed
/// containers are logged and skipped. If nothing could be converted, no file
/// is left at `mbox_path`.
///
/// Only a failure to write the mbox itself is returned as an error; the
/// partially written file is removed in that case.
pub fn convert_folder(
    source_dir: &Path,
    mbox_path: &Path,
    opts: &ConvertOptions,
) -> Result<FolderStats> {
    let containers = discover::find_messages(source_dir, &opts.message_suffix);
    convert_containers(&containers, mbox_path, opts)
}

/// Convert the given containers, in the given order, into `mbox_path`.
fn convert_containers(
    containers: &[PathBuf],
    mbox_path: &Path,
    opts: &ConvertOptions,
) -> Result<FolderStats> {
    let encoder = opts.encoder();
    let mut writer = MboxWriter::new(mbox_path);
    let mut stats = FolderStats::default();

    for path in containers {
        let raw = match emlx::read_container(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable container");
                stats.skipped += 1;
                continue;
            }
        };

        let message = match emlx::decode(&raw) {
            Ok(message) => message,
            Err(reason) => {
                warn!(path = %path.display(), reason = %reason, "Skipping malformed container");
                stats.skipped += 1;
                continue;
            }
        };

        let entry = encoder.encode(&message, Local::now().naive_local());
        if let Err(e) = writer.append(&entry) {
            writer.abort();
            return Err(e);
        }
        stats.converted += 1;
    }

    writer.finish()?;
    Ok(stats)
}
