//! Configuration parser for loading function sources and backend snapshots.
//!
//! This module handles loading the desired function source from YAML, the
//! existing-function snapshot from JSON, and environment variable overrides,
//! with proper precedence and error handling.

use crate::error::{ConfigError, FnplanError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::{ExistingSnapshot, SourceConfig};

/// Environment variable overriding the source's project id.
pub const PROJECT_ENV_VAR: &str = "FNPLAN_PROJECT";

/// Configuration parser for loading planner inputs.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a function source from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<SourceConfig> {
        let path = path.as_ref();
        info!("Loading function source from: {}", path.display());

        let content = read_file(path)?;
        self.parse_yaml(&content, Some(path))
    }

    /// Parses a function source from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<SourceConfig> {
        debug!("Parsing YAML function source");

        let config: SourceConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ConfigError::parse(format!("YAML parse error: {e}"), location)
        })?;

        debug!(
            "Parsed {} function(s) for project: {}",
            config.functions.len(),
            config.project
        );
        Ok(config)
    }

    /// Loads a function source with environment variable overrides.
    ///
    /// `FNPLAN_PROJECT` replaces the project id from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<SourceConfig> {
        let mut config = self.load_file(path)?;

        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Applies environment variable overrides to the source.
    fn apply_env_overrides(config: &mut SourceConfig) {
        if let Ok(project) = std::env::var(PROJECT_ENV_VAR) {
            debug!("Overriding project from environment");
            config.project = project;
        }
    }

    /// Loads an existing-function snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_existing(&self, path: impl AsRef<Path>) -> Result<ExistingSnapshot> {
        let path = path.as_ref();
        info!("Loading existing functions from: {}", path.display());

        let content = read_file(path)?;
        self.parse_existing(&content, Some(path))
    }

    /// Parses an existing-function snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse_existing(&self, content: &str, source: Option<&Path>) -> Result<ExistingSnapshot> {
        let snapshot: ExistingSnapshot = serde_json::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ConfigError::parse(format!("JSON parse error: {e}"), location)
        })?;

        debug!("Parsed {} existing function(s)", snapshot.functions.len());
        Ok(snapshot)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                FnplanError::Config(ConfigError::parse(
                    format!("Failed to load .env file: {e}"),
                    Some(env_path.display().to_string()),
                ))
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Reads a whole file, mapping a missing file to `ConfigError::FileNotFound`.
fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(FnplanError::Config(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }));
    }

    std::fs::read_to_string(path).map_err(|e| {
        FnplanError::Config(ConfigError::parse(
            format!("Failed to read file: {e}"),
            Some(path.display().to_string()),
        ))
    })
}

/// Default source file names to search for.
pub const DEFAULT_SOURCE_FILES: &[&str] = &[
    "fnplan.yaml",
    "fnplan.yml",
    "functions.yaml",
    "functions.yml",
];

/// Finds the source file in the given directory or its parents.
///
/// A relative `start_dir` is resolved against the working directory first,
/// so `"."` walks up through the real parent directories.
///
/// # Errors
///
/// Returns an error if no source file is found, or if the working directory
/// cannot be read.
pub fn find_source_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()?.join(start)
    };

    loop {
        for filename in DEFAULT_SOURCE_FILES {
            let source_path = current.join(filename);
            if source_path.exists() {
                info!("Found function source: {}", source_path.display());
                return Ok(source_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(FnplanError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_SOURCE_FILES[0]),
    }))
}
