//! Command-line host for the worker

pub mod args;
pub mod commands;
mod context;

pub use args::{Cli, Commands};
pub use context::HostContext;
