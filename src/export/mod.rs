//! Output writers: mbox entries and per-account export summaries.

pub mod mbox;
pub mod summary;
