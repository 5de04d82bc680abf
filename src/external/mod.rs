//! External process execution
//!
//! Everything that shells out goes through [`CommandRunner`], which merges
//! stderr into stdout, logs every invocation and honours cooperative
//! cancellation.

pub mod command;

pub use command::{CommandRunner, DEFAULT_POLL_INTERVAL, ProcessError, run_command};
