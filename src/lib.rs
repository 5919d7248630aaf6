//! `emlx2mbox`: export Apple Mail message stores to mbox.
//!
//! This crate provides the conversion engine: decoding `.emlx` containers,
//! serializing messages as mbox entries, and mapping `.mbox` folder trees
//! onto one output file per folder.

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
