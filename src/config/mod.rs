//! Configuration module for the fnplan deployment planner.
//!
//! This module handles all input-related functionality:
//! - Function definition types shared by desired and existing records
//! - Parsing the YAML function source and the JSON backend snapshot
//! - Validation of desired definitions
//! - Computing source fingerprints

mod spec;
mod parser;
mod validator;
mod hash;

pub use spec::{
    DEFAULT_REGION, DEPLOYMENT_TOOL_LABEL, EventTrigger, ExistingSnapshot, FunctionDefinition,
    HttpsTrigger, QualifiedName, SCHEDULED_LABEL, ScheduleRetryConfig, ScheduleSpec, SourceConfig,
    function_id,
};
pub use parser::{ConfigParser, DEFAULT_SOURCE_FILES, PROJECT_ENV_VAR, find_source_file};
pub use validator::{ConfigValidator, VALID_MEMORY_MB, ValidationError, ValidationResult};
pub use hash::SourceHasher;
