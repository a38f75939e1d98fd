//! Planning module for function deployments.
//!
//! This module projects desired definitions into regions and compares them
//! with the functions that exist in the backend, producing a deployment plan.

mod regions;
#[cfg_attr(test, allow(missing_docs))]
mod collaborators;
mod diff;
mod plan;

pub use regions::{RegionMap, RegionMapper};
pub use collaborators::{
    DEFAULT_TOOL_MARKER, DEFAULT_TOPIC_PREFIX, FilterGroup, FunctionFilter, LabelOwnership,
    NameChunkFilter, OwnershipCheck, ScheduleTopicNamer, TopicNamer, parse_filter_groups,
};
pub use diff::DeploymentPlanner;
pub use plan::{ActionType, DeploymentPlan, PlannedAction, RegionalDeployment};
