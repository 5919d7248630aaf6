//! Plain-text summary written next to an account export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use humansize::{format_size, BINARY};
use walkdir::WalkDir;

use crate::convert::tree::TreeReport;
use crate::error::{ExportError, Result};
use crate::model::account::AccountRecord;

/// File name of the summary inside the account directory.
pub const SUMMARY_FILE_NAME: &str = "EXPORT_INFO.txt";

/// Write the summary text to `out`.
pub fn render_account_summary(
    out: &mut impl Write,
    account: &AccountRecord,
    report: &TreeReport,
    mbox_size: u64,
    exported_at: NaiveDateTime,
) -> std::io::Result<()> {
    let rule = "=".repeat(60);

    writeln!(out, "{rule}")?;
    writeln!(out, "  MAIL EXPORT: {}", account.label)?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<17}{}",
        "Export Date:",
        exported_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "{:<17}{}", "Source:", account.source_root.display())?;
    writeln!(out, "{:<17}{}", "Total Emails:", report.total_messages())?;
    writeln!(out, "{:<17}{}", "Mbox Size:", format_size(mbox_size, BINARY))?;
    if report.messages_skipped > 0 {
        writeln!(out, "{:<17}{}", "Skipped:", report.messages_skipped)?;
    }
    writeln!(out)?;

    writeln!(out, "FOLDER BREAKDOWN:")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for (folder, count) in &report.counts {
        writeln!(out, "  {folder}: {count} emails")?;
    }

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "FAILED FOLDERS:")?;
        writeln!(out, "{}", "-".repeat(40))?;
        for failure in &report.failures {
            writeln!(out, "  {}: {}", failure.name, failure.error)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{rule}")?;
    Ok(())
}

/// Write `EXPORT_INFO.txt` into `account_dir`. Returns its path.
pub fn write_account_summary(
    account_dir: &Path,
    mbox_dir: &Path,
    account: &AccountRecord,
    report: &TreeReport,
    exported_at: NaiveDateTime,
) -> Result<PathBuf> {
    let path = account_dir.join(SUMMARY_FILE_NAME);
    let mbox_size = dir_size(mbox_dir);

    let file = File::create(&path).map_err(|e| ExportError::io(&path, e))?;
    let mut out = BufWriter::new(file);
    render_account_summary(&mut out, account, report, mbox_size, exported_at)
        .and_then(|()| out.flush())
        .map_err(|e| ExportError::io(&path, e))?;
    Ok(path)
}

/// Total size in bytes of all files below `path`.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tree::FolderFailure;
    use chrono::NaiveDate;

    #[test]
    fn test_render_summary() {
        let account = AccountRecord::new("/Users/jane/Library/Mail/V10/ABC", "jane@example.com");
        let mut report = TreeReport::default();
        report.counts.insert("Sent_Messages".into(), 2);
        report.counts.insert("INBOX".into(), 10);
        report.failures.push(FolderFailure {
            name: "Junk".into(),
            source: PathBuf::from("/x/Junk.mbox"),
            error: "disk full".into(),
        });
        let at = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();

        let mut buf = Vec::new();
        render_account_summary(&mut buf, &account, &report, 2048, at).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("  MAIL EXPORT: jane@example.com\n"));
        assert!(text.contains("Export Date:     2024-05-06 07:08:09\n"));
        assert!(text.contains("Total Emails:    12\n"));
        assert!(text.contains("Mbox Size:       2 KiB\n"));
        assert!(!text.contains("Skipped:"));
        // Folders are listed in name order.
        let inbox = text.find("  INBOX: 10 emails").unwrap();
        let sent = text.find("  Sent_Messages: 2 emails").unwrap();
        assert!(inbox < sent);
        assert!(text.contains("  Junk: disk full\n"));
    }

    #[test]
    fn test_dir_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"12345").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b"), b"123").unwrap();
        assert_eq!(dir_size(dir.path()), 8);
    }
}
