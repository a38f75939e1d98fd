//! fnplan CLI entrypoint.
//!
//! This is the main entrypoint for the fnplan command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fnplan::cli::{Cli, Commands, OutputFormatter};
use fnplan::config::{
    ConfigParser, ConfigValidator, ExistingSnapshot, SourceConfig, SourceHasher, find_source_file,
};
use fnplan::error::{ConfigError, Result};
use fnplan::planner::{DeploymentPlanner, RegionMapper, parse_filter_groups};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for errors caused by the function source or the plan inputs.
const EXIT_INPUT_ERROR: u8 = 2;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_input_error() {
                ExitCode::from(EXIT_INPUT_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the selected command.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(cli.source.as_ref(), warnings, &formatter),
        Commands::Regions => cmd_regions(cli.source.as_ref(), &formatter),
        Commands::Plan {
            existing,
            only,
            project,
        } => cmd_plan(
            cli.source.as_ref(),
            existing.as_deref(),
            only.as_deref(),
            project,
            &formatter,
        ),
    }
}

/// Validate the function source.
fn cmd_validate(
    source_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let source = load_source(source_path)?;

    let result = ConfigValidator::new().check(&source);
    println!("{}", formatter.format_validation(&source, &result, show_warnings));

    if result.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::validation_general(format!(
            "{} error(s) in function source",
            result.error_count()
        ))
        .into())
    }
}

/// Show the region map.
fn cmd_regions(source_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let source = load_source(source_path)?;
    ConfigValidator::new().validate(&source)?;

    let map = RegionMapper::new(&source.project).map(&source.functions);
    println!("{}", formatter.format_regions(&map));

    Ok(())
}

/// Compute and show the deployment plan.
fn cmd_plan(
    source_path: Option<&PathBuf>,
    existing_path: Option<&Path>,
    only: Option<&str>,
    project: Option<String>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut source = load_source(source_path)?;
    if let Some(project) = project {
        debug!("Overriding project from command line");
        source.project = project;
    }

    let validator = ConfigValidator::new();
    let result = validator.validate(&source)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    let desired = RegionMapper::new(&source.project).map(&source.functions);

    let existing = match existing_path {
        Some(path) => ConfigParser::new().load_existing(path)?,
        None => {
            info!("No existing snapshot given, planning a first deployment");
            ExistingSnapshot::default()
        }
    };

    let filters = parse_filter_groups(only);
    if !filters.is_empty() {
        debug!("Planning with {} filter group(s)", filters.len());
    }

    let plan = DeploymentPlanner::new().plan(desired, &existing.functions, &filters)?;

    let source_hash = SourceHasher::new().hash_source(&source);
    println!("{}", formatter.format_plan(&plan, &source_hash));

    Ok(())
}

// ============================================================================
// Helper functions
// ============================================================================

/// Resolves the source file path, discovering it when not given.
fn resolve_source_path(source_path: Option<&PathBuf>) -> Result<PathBuf> {
    source_path.map_or_else(|| find_source_file("."), |path| Ok(path.clone()))
}

/// Loads the function source with its `.env` and environment overrides.
fn load_source(source_path: Option<&PathBuf>) -> Result<SourceConfig> {
    let source_file = resolve_source_path(source_path)?;
    debug!("Loading function source from: {}", source_file.display());

    let parser = ConfigParser::new()
        .with_base_path(source_file.parent().unwrap_or_else(|| Path::new(".")));
    parser.load_dotenv()?;

    let source = parser.load_with_env(&source_file)?;
    if source.functions.is_empty() {
        info!("Function source declares no functions");
    }

    Ok(source)
}
