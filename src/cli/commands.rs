//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fnplan - Region-aware deployment planner for serverless functions.
#[derive(Parser, Debug)]
#[command(name = "fnplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the function source file.
    #[arg(short, long, global = true, env = "FNPLAN_SOURCE")]
    pub source: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the function source.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show which functions land in which region.
    Regions,

    /// Compute and display the deployment plan.
    Plan {
        /// JSON snapshot of the functions currently deployed.
        #[arg(short, long)]
        existing: Option<PathBuf>,

        /// Limit the plan to selected functions (e.g. "functions:api,functions:jobs.nightly").
        #[arg(long)]
        only: Option<String>,

        /// Override the project id from the source.
        #[arg(short, long)]
        project: Option<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
