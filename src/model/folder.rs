//! Mailbox folder units.

use std::path::{Path, PathBuf};

/// One `.mbox` folder found under a source root, and the output file it maps to.
///
/// Every message container found anywhere beneath `source` ends up in the
/// single output file `<name>.mbox`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderUnit {
    /// Absolute (or caller-relative) path of the folder directory.
    pub source: PathBuf,
    /// Path of the folder relative to the source root it was found under.
    pub relative: PathBuf,
    /// Sanitized, collision-free output name (without extension).
    pub name: String,
}

impl FolderUnit {
    /// Extension of every output container.
    pub const OUTPUT_EXTENSION: &'static str = "mbox";

    /// File name of the output container, e.g. `INBOX.mbox`.
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.name, Self::OUTPUT_EXTENSION)
    }

    /// Full output path of this unit's container inside `output_root`.
    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(self.output_file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let unit = FolderUnit {
            source: PathBuf::from("/src/INBOX.mbox"),
            relative: PathBuf::from("INBOX.mbox"),
            name: "INBOX".to_string(),
        };
        assert_eq!(unit.output_path(Path::new("/out")), PathBuf::from("/out/INBOX.mbox"));
    }
}
