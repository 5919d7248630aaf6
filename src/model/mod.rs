//! Core data model types: decoded messages, folder units, and accounts.

pub mod account;
pub mod folder;
pub mod message;
