//! Export one account into its own directory.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::convert::tree::{convert_tree, TreeReport};
use crate::convert::{ConvertOptions, ProgressFn};
use crate::error::{ExportError, Result};
use crate::export::summary;
use crate::model::account::AccountRecord;

/// Directory holding the mbox files inside an account directory.
pub const MBOX_DIR_NAME: &str = "mbox_format";

/// Where an account export landed and what it contains.
#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub label: String,
    pub account_dir: PathBuf,
    pub mbox_dir: PathBuf,
    pub summary_path: PathBuf,
    pub report: TreeReport,
}

/// Convert an account into `<output_root>/<account dir>/mbox_format/` and
/// write a summary file next to it.
///
/// ```text
/// <output_root>/
/// └── jane_at_example_com/
///     ├── EXPORT_INFO.txt
///     └── mbox_format/
///         ├── INBOX.mbox
///         └── Sent_Messages.mbox
/// ```
pub fn export_account(
    account: &AccountRecord,
    output_root: &Path,
    opts: &ConvertOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<AccountReport> {
    let account_dir = output_root.join(account.dir_name());
    let mbox_dir = account_dir.join(MBOX_DIR_NAME);
    std::fs::create_dir_all(&mbox_dir).map_err(|e| ExportError::io(&mbox_dir, e))?;

    info!(
        account = %account.label,
        source = %account.source_root.display(),
        output = %account_dir.display(),
        "Exporting account"
    );

    let report = convert_tree(&account.source_root, &mbox_dir, opts, progress)?;
    let summary_path = summary::write_account_summary(
        &account_dir,
        &mbox_dir,
        account,
        &report,
        Local::now().naive_local(),
    )?;

    Ok(AccountReport {
        label: account.label.clone(),
        account_dir,
        mbox_dir,
        summary_path,
        report,
    })
}
