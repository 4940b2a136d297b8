//! Subcommand implementations.

pub mod pack;
