//! Subcommand implementations.

pub mod check;
pub mod describe;
pub mod elements;
pub mod init;
pub mod list_rules;
pub mod output;
