//! Message parsing: `.emlx` container decoding and envelope header scanning.

pub mod emlx;
pub mod header;
