//! Convert every mailbox folder below a source root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::convert::folder::{convert_folder, FolderStats};
use crate::convert::{discover, ConvertOptions, ProgressFn};
use crate::error::{ExportError, Result};
use crate::model::folder::FolderUnit;

/// A folder whose mbox could not be written.
#[derive(Debug, Clone, Serialize)]
pub struct FolderFailure {
    pub name: String,
    pub source: PathBuf,
    pub error: String,
}

/// Outcome of a [`convert_tree`] pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeReport {
    /// Output name → number of messages written. Empty folders are absent.
    pub counts: BTreeMap<String, u64>,
    /// Number of folders found.
    pub folders_scanned: usize,
    /// Folders that produced no mbox because nothing could be converted.
    pub empty_folders: usize,
    /// Containers that could not be read or decoded.
    pub messages_skipped: u64,
    /// Folders whose mbox could not be written.
    pub failures: Vec<FolderFailure>,
}

impl TreeReport {
    pub fn total_messages(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Whether anything was skipped or failed.
    pub fn is_partial(&self) -> bool {
        self.messages_skipped > 0 || !self.failures.is_empty()
    }
}

/// A folder found by [`list_folders`], without converting it.
#[derive(Debug, Clone, Serialize)]
pub struct FolderListing {
    pub name: String,
    pub source: PathBuf,
    /// Message containers found below the folder.
    pub containers: usize,
}

/// Convert every `.mbox` folder below `source_root` into `<output_root>/<name>.mbox`.
///
/// Folders are converted on a pool of `opts.jobs` threads; each output file
/// is written by exactly one worker. A folder that fails does not affect the
/// others and is reported in [`TreeReport::failures`].
///
/// Returns an error only if `source_root` is not a readable directory or
/// `output_root` cannot be created.
pub fn convert_tree(
    source_root: &Path,
    output_root: &Path,
    opts: &ConvertOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<TreeReport> {
    ensure_dir(source_root)?;
    std::fs::create_dir_all(output_root).map_err(|e| ExportError::io(output_root, e))?;

    let units = discover::discover_folders(source_root, &opts.folder_suffix);
    info!(
        source = %source_root.display(),
        folders = units.len(),
        "Converting folders"
    );

    let total = units.len();
    let done = AtomicUsize::new(0);

    let results = run_pool(&units, opts.jobs, |unit| {
        let result = convert_folder(&unit.source, &unit.output_path(output_root), opts);
        log_folder_result(unit, &result, opts.verbose);

        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(cb) = progress {
            cb(finished, total, &unit.name);
        }
        result
    });

    let mut report = TreeReport {
        folders_scanned: total,
        ..TreeReport::default()
    };

    for (unit, result) in units.iter().zip(results) {
        match result {
            Ok(stats) => {
                report.messages_skipped += stats.skipped;
                if stats.converted > 0 {
                    report.counts.insert(unit.name.clone(), stats.converted);
                } else {
                    report.empty_folders += 1;
                }
            }
            Err(e) => report.failures.push(FolderFailure {
                name: unit.name.clone(),
                source: unit.source.clone(),
                error: e.to_string(),
            }),
        }
    }

    Ok(report)
}

/// Discover folders and count their containers without writing anything.
pub fn list_folders(source_root: &Path, opts: &ConvertOptions) -> Result<Vec<FolderListing>> {
    ensure_dir(source_root)?;

    let listings = discover::discover_folders(source_root, &opts.folder_suffix)
        .into_iter()
        .map(|unit| FolderListing {
            containers: discover::find_messages(&unit.source, &opts.message_suffix).len(),
            name: unit.name,
            source: unit.source,
        })
        .collect();

    Ok(listings)
}

fn ensure_dir(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| ExportError::from_io(path, e))?;
    if !metadata.is_dir() {
        return Err(ExportError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Run `work` over every unit on a bounded pool, keeping input order.
fn run_pool<T, F>(units: &[FolderUnit], jobs: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(&FolderUnit) -> T + Sync,
{
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| units.par_iter().map(&work).collect()),
        Err(e) => {
            warn!(error = %e, "Could not start worker pool, converting sequentially");
            units.iter().map(&work).collect()
        }
    }
}

fn log_folder_result(unit: &FolderUnit, result: &Result<FolderStats>, verbose: bool) {
    match result {
        Ok(stats) if stats.converted == 0 => {
            debug!(folder = %unit.name, skipped = stats.skipped, "Folder is empty");
        }
        Ok(stats) if verbose => {
            info!(
                folder = %unit.name,
                messages = stats.converted,
                skipped = stats.skipped,
                "Converted folder"
            );
        }
        Ok(stats) => {
            debug!(
                folder = %unit.name,
                messages = stats.converted,
                skipped = stats.skipped,
                "Converted folder"
            );
        }
        Err(e) => {
            error!(folder = %unit.name, error = %e, "Folder conversion failed");
        }
    }
}
