//! CLI module for the fnplan deployment planner.
//!
//! This module provides the command-line interface for computing and
//! inspecting deployment plans.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
