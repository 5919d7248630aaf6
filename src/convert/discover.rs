//! Find mailbox folders and message containers below a source root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::model::folder::FolderUnit;

/// Find every directory below `source_root` whose name ends in `folder_suffix`.
///
/// Folders nested inside other folders are returned too. The result is in
/// sorted depth-first order, and every unit has a distinct output name.
pub fn discover_folders(source_root: &Path, folder_suffix: &str) -> Vec<FolderUnit> {
    let mut units = Vec::new();

    for entry in WalkDir::new(source_root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(folder_suffix) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(source_root) else {
            continue;
        };
        let relative = relative.to_path_buf();
        let name = output_name(&relative, folder_suffix);

        units.push(FolderUnit {
            source: entry.path().to_path_buf(),
            relative,
            name,
        });
    }

    dedupe_names(&mut units);
    units
}

/// Derive the output name of a folder from its path relative to the source root.
///
/// `INBOX.mbox` → `INBOX`; `[Gmail].mbox/All Mail.mbox` → `Gmail_All_Mail`.
pub fn output_name(relative: &Path, folder_suffix: &str) -> String {
    let segments: Vec<String> = relative
        .iter()
        .map(|s| s.to_string_lossy().into_owned())
        .collect();

    let leaf = segments.last().map(String::as_str).unwrap_or_default();
    let name = sanitize_segment(leaf, folder_suffix);

    if segments.len() > 1 {
        format!("{}_{}", sanitize_segment(&segments[0], folder_suffix), name)
    } else {
        name
    }
}

/// Strip the folder suffix and brackets, and replace anything that is not a
/// word character or `-` with `_`.
pub fn sanitize_segment(segment: &str, folder_suffix: &str) -> String {
    let stem = segment.strip_suffix(folder_suffix).unwrap_or(segment);
    let sanitized: String = stem
        .chars()
        .filter(|&c| c != '[' && c != ']')
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}

/// Give later duplicates a `_2`, `_3`, … suffix.
///
/// Names are compared case-insensitively since the output may live on a
/// case-insensitive filesystem.
fn dedupe_names(units: &mut [FolderUnit]) {
    let mut taken: HashSet<String> = HashSet::new();

    for unit in units.iter_mut() {
        if taken.insert(unit.name.to_lowercase()) {
            continue;
        }

        let mut n = 2;
        let unique = loop {
            let candidate = format!("{}_{n}", unit.name);
            if taken.insert(candidate.to_lowercase()) {
                break candidate;
            }
            n += 1;
        };

        warn!(
            folder = %unit.relative.display(),
            name = %unit.name,
            renamed = %unique,
            "Output name already taken, renaming"
        );
        unit.name = unique;
    }
}

/// Find every message container anywhere below `folder`, sorted by full path.
pub fn find_messages(folder: &Path, message_suffix: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(message_suffix))
        .map(walkdir::DirEntry::into_path)
        .collect();

    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    paths
}
