//! Integration tests for folder discovery, conversion, and account export.

use std::path::Path;

use assert_fs::prelude::*;
use predicates::prelude::*;

use emlx2mbox::convert::account::{export_account, MBOX_DIR_NAME};
use emlx2mbox::convert::tree::{convert_tree, list_folders};
use emlx2mbox::convert::ConvertOptions;
use emlx2mbox::export::summary::SUMMARY_FILE_NAME;
use emlx2mbox::model::account::AccountRecord;

const PLIST: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
<plist version=\"1.0\">\n<dict>\n\t<key>flags</key>\n\t<integer>8590195713</integer>\n</dict>\n</plist>\n";

fn emlx(content: &[u8]) -> Vec<u8> {
    let mut raw = format!("{}\n", content.len()).into_bytes();
    raw.extend_from_slice(content);
    raw.extend_from_slice(PLIST);
    raw
}

/// Build a small Mail.app-like account tree:
///
/// ```text
/// INBOX.mbox/<uuid>/Data/0/1/Messages/{101,102}.emlx
/// INBOX.mbox/<uuid>/Data/0/2/Messages/205.partial.emlx
/// [Gmail].mbox/All Mail.mbox/Messages/1.emlx
/// Sent Messages.mbox/Messages/7.emlx          (malformed, no terminator)
/// Drafts.mbox/                                (empty)
/// ```
fn build_account(root: &assert_fs::TempDir) {
    let inbox = root.child("INBOX.mbox/7B8D9E0F-1A2B-4C3D-8E9F-0A1B2C3D4E5F/Data/0");
    inbox
        .child("1/Messages/101.emlx")
        .write_binary(&emlx(
            b"From: Jane Doe <jane@example.com>\r\nTo: bob@example.com\r\n\
Date: Mon, 01 Jan 2024 12:00:00 +0000\r\nSubject: Hello\r\n\r\nHi Bob,\r\n\
From now on we meet on Mondays.\r\n",
        ))
        .unwrap();
    inbox
        .child("1/Messages/102.emlx")
        .write_binary(&emlx(
            b"From: alerts@example.org\nDate: 15 Feb 2024 08:30:00 -0500\nSubject: Alert\n\nbody without newline",
        ))
        .unwrap();
    inbox
        .child("2/Messages/205.partial.emlx")
        .write_binary(&emlx(
            b"From: Mailer <noreply@example.net>\nDate: Fri, 01 Mar 2024 09:00:00\n\npartial\n",
        ))
        .unwrap();
    inbox.child("1/Messages/notes.txt").write_str("ignore me").unwrap();

    root.child("[Gmail].mbox/All Mail.mbox/Messages/1.emlx")
        .write_binary(&emlx(
            b"From: someone@example.com\nDate: Sat, 02 Mar 2024 10:00:00 +0100\n\ngmail\n",
        ))
        .unwrap();

    root.child("Sent Messages.mbox/Messages/7.emlx")
        .write_binary(b"broken container without terminator")
        .unwrap();

    root.child("Drafts.mbox").create_dir_all().unwrap();
}

fn opts() -> ConvertOptions {
    ConvertOptions {
        jobs: 2,
        ..ConvertOptions::default()
    }
}

#[test]
fn test_convert_tree_counts_and_files() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    let report = convert_tree(source.path(), output.path(), &opts(), None).unwrap();

    assert_eq!(report.folders_scanned, 5);
    assert_eq!(report.counts.get("INBOX"), Some(&3));
    assert_eq!(report.counts.get("Gmail"), Some(&1));
    assert_eq!(report.counts.get("Gmail_All_Mail"), Some(&1));
    assert_eq!(report.counts.len(), 3);
    assert_eq!(report.empty_folders, 2);
    assert_eq!(report.messages_skipped, 1);
    assert!(report.failures.is_empty());
    assert!(report.is_partial());
    assert_eq!(report.total_messages(), 5);

    output.child("INBOX.mbox").assert(predicate::path::is_file());
    output.child("Gmail_All_Mail.mbox").assert(predicate::path::is_file());
    output.child("Sent_Messages.mbox").assert(predicate::path::missing());
    output.child("Drafts.mbox").assert(predicate::path::missing());
}

#[test]
fn test_inbox_content_is_exact() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    convert_tree(source.path(), output.path(), &opts(), None).unwrap();

    let data = std::fs::read(output.child("INBOX.mbox").path()).unwrap();
    let expected: &[u8] = b"From jane@example.com Mon Jan 01 12:00:00 2024\n\
From: Jane Doe <jane@example.com>\r\nTo: bob@example.com\r\n\
Date: Mon, 01 Jan 2024 12:00:00 +0000\r\nSubject: Hello\r\n\r\nHi Bob,\r\n\
>From now on we meet on Mondays.\r\n\n\
From alerts@example.org Thu Feb 15 08:30:00 2024\n\
From: alerts@example.org\nDate: 15 Feb 2024 08:30:00 -0500\nSubject: Alert\n\nbody without newline\n\n\
From noreply@example.net Fri Mar 01 09:00:00 2024\n\
From: Mailer <noreply@example.net>\nDate: Fri, 01 Mar 2024 09:00:00\n\npartial\n\n";
    assert_eq!(data, expected);
}

#[test]
fn test_no_unescaped_from_lines_inside_entries() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    convert_tree(source.path(), output.path(), &opts(), None).unwrap();

    let data = std::fs::read(output.child("INBOX.mbox").path()).unwrap();
    let separators = data
        .split(|&b| b == b'\n')
        .filter(|line| line.starts_with(b"From "))
        .count();
    assert_eq!(separators, 3);
}

#[test]
fn test_conversion_is_deterministic() {
    let source = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    let first = assert_fs::TempDir::new().unwrap();
    let second = assert_fs::TempDir::new().unwrap();
    convert_tree(source.path(), first.path(), &opts(), None).unwrap();
    let sequential = ConvertOptions {
        jobs: 1,
        ..ConvertOptions::default()
    };
    convert_tree(source.path(), second.path(), &sequential, None).unwrap();

    for name in ["INBOX.mbox", "Gmail.mbox", "Gmail_All_Mail.mbox"] {
        let a = std::fs::read(first.child(name).path()).unwrap();
        let b = std::fs::read(second.child(name).path()).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn test_rerun_removes_stale_empty_output() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);
    output
        .child("Drafts.mbox")
        .write_str("From old Thu Jan 01 00:00:00 1970\n\n")
        .unwrap();

    convert_tree(source.path(), output.path(), &opts(), None).unwrap();

    output.child("Drafts.mbox").assert(predicate::path::missing());
}

#[test]
fn test_failed_folder_does_not_stop_others() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);
    // A directory where the INBOX mbox should go makes that one write fail.
    output.child("INBOX.mbox").create_dir_all().unwrap();

    let report = convert_tree(source.path(), output.path(), &opts(), None).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "INBOX");
    assert!(report.failures[0].source.ends_with("INBOX.mbox"));
    assert!(!report.counts.contains_key("INBOX"));
    assert_eq!(report.counts.get("Gmail_All_Mail"), Some(&1));
    assert!(report.is_partial());

    output.child("INBOX.mbox").assert(predicate::path::is_dir());
    output.child("Gmail.mbox").assert(predicate::path::is_file());
    output.child("Gmail_All_Mail.mbox").assert(predicate::path::is_file());
}

#[test]
fn test_progress_reports_every_folder() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    let seen = std::sync::Mutex::new(Vec::new());
    let progress = |done: usize, total: usize, name: &str| {
        seen.lock().unwrap().push((done, total, name.to_string()));
    };
    convert_tree(source.path(), output.path(), &opts(), Some(&progress)).unwrap();

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    let done: Vec<usize> = seen.iter().map(|(d, _, _)| *d).collect();
    assert_eq!(done, [1, 2, 3, 4, 5]);
    assert!(seen.iter().all(|(_, total, _)| *total == 5));
}

#[test]
fn test_list_folders_dry_run() {
    let source = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    let listings = list_folders(source.path(), &opts()).unwrap();
    let summary: Vec<(&str, usize)> = listings
        .iter()
        .map(|l| (l.name.as_str(), l.containers))
        .collect();
    assert_eq!(
        summary,
        [
            ("Drafts", 0),
            ("INBOX", 3),
            ("Sent_Messages", 1),
            ("Gmail", 1),
            ("Gmail_All_Mail", 1),
        ]
    );
}

#[test]
fn test_export_account_layout() {
    let source = assert_fs::TempDir::new().unwrap();
    let output = assert_fs::TempDir::new().unwrap();
    build_account(&source);

    let account = AccountRecord::new(source.path(), "jane.doe@example.com");
    let exported = export_account(&account, output.path(), &opts(), None).unwrap();

    let account_dir = output.child("jane_doe_at_example_com");
    assert_eq!(exported.account_dir, account_dir.path());
    account_dir
        .child(MBOX_DIR_NAME)
        .child("INBOX.mbox")
        .assert(predicate::path::is_file());
    account_dir
        .child(SUMMARY_FILE_NAME)
        .assert(predicate::str::contains("MAIL EXPORT: jane.doe@example.com"))
        .assert(predicate::str::contains("Total Emails:    5"))
        .assert(predicate::str::contains("  INBOX: 3 emails"));
    assert_eq!(exported.report.total_messages(), 5);
}

#[test]
fn test_missing_source_is_an_error() {
    let output = assert_fs::TempDir::new().unwrap();
    let missing = Path::new("/definitely/not/here/emlx2mbox");
    assert!(convert_tree(missing, output.path(), &opts(), None).is_err());
}
