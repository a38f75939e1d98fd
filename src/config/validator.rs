//! Validation for function sources.
//!
//! This module checks desired function definitions before they are projected
//! into regions, so malformed input fails fast instead of producing an
//! inconsistent plan.

use crate::error::{ConfigError, FnplanError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{FunctionDefinition, SourceConfig};

/// Memory sizes (in MB) the backend accepts.
pub const VALID_MEMORY_MB: &[u32] = &[128, 256, 512, 1024, 2048, 4096, 8192];

/// Maximum length of a function's local name.
const MAX_NAME_LEN: usize = 63;

/// Validator for function sources.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
    /// Resource type and name, set when the error is a duplicate definition.
    pub duplicate: Option<(&'static str, String)>,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a function source.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &SourceConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if result.errors.is_empty() {
            debug!("Function source validation passed");
            Ok(result)
        } else {
            Err(FnplanError::Config(result.errors[0].to_config_error()))
        }
    }

    /// Runs every check and returns all errors and warnings without failing.
    #[must_use]
    pub fn check(&self, config: &SourceConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        if config.project.trim().is_empty() {
            result.errors.push(ValidationError::new(
                String::from("project"),
                String::from("Project id cannot be empty"),
            ));
        }

        Self::validate_functions(&config.functions, &mut result);
        result
    }

    /// Validates all function definitions.
    fn validate_functions(functions: &[FunctionDefinition], result: &mut ValidationResult) {
        if functions.is_empty() {
            result.warnings.push(String::from("No functions defined in source"));
            return;
        }

        let mut seen_names = HashSet::new();

        for (i, function) in functions.iter().enumerate() {
            let prefix = format!("functions[{i}]");

            if !seen_names.insert(function.name.as_str()) {
                result.errors.push(ValidationError::duplicate(
                    format!("{prefix}.name"),
                    "function",
                    &function.name,
                ));
            }

            if !is_valid_function_name(&function.name) {
                result.errors.push(ValidationError::new(
                    format!("{prefix}.name"),
                    format!(
                        "Function name '{}' is invalid. Must start with a letter and contain only letters, digits, '_' or '-' (max {MAX_NAME_LEN} characters).",
                        function.name
                    ),
                ));
            }

            Self::validate_regions(function, &prefix, result);
            Self::validate_triggers(function, &prefix, result);
            Self::validate_resources(function, &prefix, result);
        }
    }

    /// Validates the region list of a definition.
    fn validate_regions(function: &FunctionDefinition, prefix: &str, result: &mut ValidationResult) {
        let Some(regions) = &function.regions else {
            return;
        };

        if regions.is_empty() {
            result.warnings.push(format!(
                "{prefix}.regions: Empty region list, '{}' will deploy to the default region",
                function.name
            ));
            return;
        }

        let mut seen = HashSet::new();
        for (i, region) in regions.iter().enumerate() {
            if region.trim().is_empty() {
                result.errors.push(ValidationError::new(
                    format!("{prefix}.regions[{i}]"),
                    String::from("Region cannot be empty"),
                ));
            } else if !seen.insert(region.as_str()) {
                result.errors.push(ValidationError::duplicate(
                    format!("{prefix}.regions[{i}]"),
                    "region",
                    region,
                ));
            }
        }
    }

    /// Validates trigger and schedule shape.
    fn validate_triggers(function: &FunctionDefinition, prefix: &str, result: &mut ValidationResult) {
        match (&function.https_trigger, &function.event_trigger) {
            (Some(_), Some(_)) => result.errors.push(ValidationError::new(
                format!("{prefix}.httpsTrigger"),
                format!(
                    "Function '{}' cannot have both an HTTPS trigger and an event trigger",
                    function.name
                ),
            )),
            (None, None) => result.errors.push(ValidationError::new(
                format!("{prefix}.eventTrigger"),
                format!("Function '{}' has no trigger", function.name),
            )),
            _ => {}
        }

        match &function.schedule {
            Some(schedule) => {
                if function.event_trigger.is_none() {
                    result.errors.push(ValidationError::new(
                        format!("{prefix}.eventTrigger"),
                        format!(
                            "Scheduled function '{}' requires an event trigger to receive the schedule topic",
                            function.name
                        ),
                    ));
                }
                if schedule.schedule.trim().is_empty() {
                    result.errors.push(ValidationError::new(
                        format!("{prefix}.schedule.schedule"),
                        format!("Scheduled function '{}' has an empty schedule", function.name),
                    ));
                }
            }
            None => {
                if function.time_zone.is_some() {
                    result.warnings.push(format!(
                        "{prefix}.timeZone: Ignored because '{}' has no schedule",
                        function.name
                    ));
                }
            }
        }
    }

    /// Validates memory and instance settings.
    fn validate_resources(function: &FunctionDefinition, prefix: &str, result: &mut ValidationResult) {
        if let Some(memory) = function.available_memory_mb {
            if !VALID_MEMORY_MB.contains(&memory) {
                result.errors.push(ValidationError::new(
                    format!("{prefix}.availableMemoryMb"),
                    format!(
                        "Memory {memory}MB is not supported. Expected one of: {VALID_MEMORY_MB:?}"
                    ),
                ));
            }
        }

        if function.max_instances == Some(0) {
            result.errors.push(ValidationError::new(
                format!("{prefix}.maxInstances"),
                String::from("maxInstances must be at least 1"),
            ));
        }

        if let (Some(min), Some(max)) = (function.min_instances, function.max_instances) {
            if min > max {
                result.warnings.push(format!(
                    "{prefix}.minInstances: {min} is greater than maxInstances {max}"
                ));
            }
        }
    }
}

/// Validates that a local function name follows the naming convention.
/// Names start with a letter and continue with letters, digits, '_' or '-'.
fn is_valid_function_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }

    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl ValidationError {
    /// Creates a validation error for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            duplicate: None,
        }
    }

    /// Creates an error for a name that is defined more than once.
    #[must_use]
    pub fn duplicate(field: impl Into<String>, resource_type: &'static str, name: &str) -> Self {
        Self {
            field: field.into(),
            message: format!("Duplicate {resource_type} name: {name}"),
            duplicate: Some((resource_type, name.to_string())),
        }
    }

    /// Converts into the error returned by [`ConfigValidator::validate`].
    #[must_use]
    pub fn to_config_error(&self) -> ConfigError {
        match &self.duplicate {
            Some((resource_type, name)) => ConfigError::DuplicateName {
                resource_type: (*resource_type).to_string(),
                name: name.clone(),
            },
            None => ConfigError::validation(self.message.clone(), self.field.clone()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{EventTrigger, ScheduleSpec};

    fn source(functions: Vec<FunctionDefinition>) -> SourceConfig {
        SourceConfig {
            project: String::from("demo"),
            functions,
        }
    }

    fn scheduled(name: &str) -> FunctionDefinition {
        FunctionDefinition {
            name: name.to_string(),
            event_trigger: Some(EventTrigger {
                event_type: String::from("google.pubsub.topic.publish"),
                ..EventTrigger::default()
            }),
            schedule: Some(ScheduleSpec {
                schedule: String::from("every 5 minutes"),
                retry_config: None,
            }),
            ..FunctionDefinition::default()
        }
    }

    #[test]
    fn test_valid_function_name() {
        assert!(is_valid_function_name("api"));
        assert!(is_valid_function_name("api-v2"));
        assert!(is_valid_function_name("Api_Handler2"));
    }

    #[test]
    fn test_invalid_function_name() {
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name("2api")); // starts with digit
        assert!(!is_valid_function_name("api.v2")); // dot
        assert!(!is_valid_function_name(&"a".repeat(64))); // too long
    }

    #[test]
    fn test_valid_source() {
        let validator = ConfigValidator::new();
        let result = validator
            .validate(&source(vec![FunctionDefinition::https("api"), scheduled("nightly")]))
            .unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_duplicate_names() {
        let validator = ConfigValidator::new();
        let result = validator.check(&source(vec![
            FunctionDefinition::https("api"),
            FunctionDefinition::https("api"),
        ]));
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].field, "functions[1].name");

        let err = validator
            .validate(&source(vec![
                FunctionDefinition::https("api"),
                FunctionDefinition::https("api"),
            ]))
            .unwrap_err();
        match err {
            FnplanError::Config(ConfigError::DuplicateName {
                resource_type,
                name,
            }) => {
                assert_eq!(resource_type, "function");
                assert_eq!(name, "api");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(FnplanError::from(ConfigError::DuplicateName {
            resource_type: String::from("function"),
            name: String::from("api"),
        })
        .is_input_error());
    }

    #[test]
    fn test_schedule_requires_event_trigger() {
        let mut def = scheduled("nightly");
        def.event_trigger = None;
        def.https_trigger = Some(crate::config::spec::HttpsTrigger::default());

        let validator = ConfigValidator::new();
        let err = validator.validate(&source(vec![def])).unwrap_err();
        assert!(err.to_string().contains("requires an event trigger"));
    }

    #[test]
    fn test_conflicting_triggers() {
        let mut def = scheduled("nightly");
        def.https_trigger = Some(crate::config::spec::HttpsTrigger::default());

        let result = ConfigValidator::new().check(&source(vec![def]));
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_region_checks() {
        let mut dup = FunctionDefinition::https("api");
        dup.regions = Some(vec![String::from("us-east1"), String::from("us-east1")]);
        let mut empty = FunctionDefinition::https("worker");
        empty.regions = Some(vec![]);

        let result = ConfigValidator::new().check(&source(vec![dup, empty]));
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].field, "functions[0].regions[1]");
        assert_eq!(result.warning_count(), 1);
        assert!(matches!(
            result.errors[0].to_config_error(),
            ConfigError::DuplicateName { ref resource_type, ref name }
                if resource_type == "region" && name == "us-east1"
        ));
    }

    #[test]
    fn test_resource_checks() {
        let mut def = FunctionDefinition::https("api");
        def.available_memory_mb = Some(300);
        def.max_instances = Some(0);

        let result = ConfigValidator::new().check(&source(vec![def]));
        assert_eq!(result.error_count(), 2);
    }

    #[test]
    fn test_time_zone_without_schedule_warns() {
        let mut def = FunctionDefinition::https("api");
        def.time_zone = Some(String::from("Europe/Paris"));

        let result = ConfigValidator::new().check(&source(vec![def]));
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_empty_project() {
        let mut config = source(vec![FunctionDefinition::https("api")]);
        config.project = String::new();

        let result = ConfigValidator::new().check(&config);
        assert_eq!(result.errors[0].field, "project");
    }
}
