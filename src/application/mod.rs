//! Application layer - CLI use cases

pub mod commands;

pub use commands::{Cli, CommandExecutor, Commands};
