//! CLI module - argument parsing and subcommands

mod args;
pub mod drift;

pub use args::{Cli, Commands};
