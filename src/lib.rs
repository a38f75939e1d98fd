// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # fnplan
//!
//! A region-aware deployment planner for serverless functions.
//!
//! ## Overview
//!
//! fnplan compares the functions declared in a source file with the
//! functions that already exist in the backend and produces a plan:
//! which functions to create, update or delete, and which schedules to
//! create, update or delete. It never calls the cloud API itself; the
//! plan is handed to whoever performs the deployment.
//!
//! ## Architecture
//!
//! Planning runs in two pure stages:
//!
//! 1. **Region Mapper**: projects each definition into one fully qualified
//!    record per target region
//! 2. **Deployment Planner**: diffs the region map against the existing
//!    functions, honouring the `--only` filter and the ownership label
//!
//! ## Modules
//!
//! - [`config`]: Function definitions, source loading, validation, hashing
//! - [`planner`]: Region mapping, collaborators and the diff
//! - [`cli`]: Command-line interface
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```yaml
//! project: my-project
//!
//! functions:
//!   - name: api
//!     regions: [us-east1, europe-west1]
//!     httpsTrigger: {}
//!   - name: nightly-report
//!     eventTrigger:
//!       eventType: google.pubsub.topic.publish
//!     schedule:
//!       schedule: "0 3 * * *"
//!     timeZone: Europe/Paris
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod planner;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, FunctionDefinition, SourceConfig, SourceHasher};
pub use error::{FnplanError, Result};
pub use planner::{DeploymentPlan, DeploymentPlanner, RegionMap, RegionMapper};
