//! Command implementations for the capflow CLI
//!
//! Each subcommand owns its clap `Args` and an async `execute`.

pub mod classify;
pub mod config;
pub mod exec;
pub mod load;
pub mod version;
