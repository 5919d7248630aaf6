//! Accounts handed over by the account discovery layer.

use std::path::PathBuf;

/// A mail account to export: where its message store lives and what to call it.
///
/// The label is typically the account's e-mail address, but any
/// human-readable string works (e.g. `"On My Mac"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Root of the account's raw message store.
    pub source_root: PathBuf,
    /// Resolved display identity of the account.
    pub label: String,
}

impl AccountRecord {
    pub fn new(source_root: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            label: label.into(),
        }
    }

    /// Directory name used for this account inside an export root.
    ///
    /// `jane.doe@example.com` → `jane_doe_at_example_com`. Labels without an
    /// `@` are sanitized as-is; an empty label becomes `account`.
    pub fn dir_name(&self) -> String {
        let label = self.label.trim();
        let raw = if label.contains('@') {
            label.replace('@', "_at_").replace('.', "_")
        } else {
            label.to_string()
        };

        let sanitized: String = raw
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized.is_empty() {
            "account".to_string()
        } else {
            sanitized
        }
    }
}
