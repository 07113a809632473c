//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod sessions;
