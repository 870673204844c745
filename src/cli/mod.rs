//! CLI argument parsing

mod commands;

pub use commands::{AppCommands, Cli, Commands};
