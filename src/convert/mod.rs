//! Conversion of `.mbox` folder trees into mbox files.
//!
//! Entry points:
//! - [`folder::convert_folder`]: one folder directory into one mbox file
//! - [`tree::convert_tree`]: every folder below a source root
//! - [`account::export_account`]: one account into its own export directory

pub mod account;
pub mod discover;
pub mod folder;
pub mod tree;

use crate::config::ConvertConfig;
use crate::export::mbox::MboxEncoder;

/// Progress sink called once per finished folder with `(done, total, folder_name)`.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize, &str) + Sync);

/// Runtime settings for a conversion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Folders converted in parallel (0 = one per CPU).
    pub jobs: usize,
    /// Log every folder at `info` level instead of `debug`.
    pub verbose: bool,
    /// Characters of a `Date:` value considered when parsing.
    pub date_prefix_len: usize,
    /// Directory suffix marking a mailbox folder.
    pub folder_suffix: String,
    /// File suffix marking a message container.
    pub message_suffix: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from(&ConvertConfig::default())
    }
}

impl From<&ConvertConfig> for ConvertOptions {
    fn from(cfg: &ConvertConfig) -> Self {
        Self {
            jobs: cfg.jobs,
            verbose: cfg.verbose,
            date_prefix_len: cfg.date_prefix_len,
            folder_suffix: cfg.folder_suffix.clone(),
            message_suffix: cfg.message_suffix.clone(),
        }
    }
}

impl ConvertOptions {
    pub fn encoder(&self) -> MboxEncoder {
        MboxEncoder::new(self.date_prefix_len)
    }
}
