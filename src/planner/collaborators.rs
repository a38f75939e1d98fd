//! Collaborators consumed by the deployment planner.
//!
//! The planner does not know filter syntax, topic naming or ownership rules.
//! It asks these traits instead, and callers inject their own implementations
//! where the defaults do not fit.

use std::collections::HashMap;

use crate::config::{DEPLOYMENT_TOOL_LABEL, QualifiedName, function_id};

/// A conjunction of name chunks; a function matches when its id starts with them.
pub type FilterGroup = Vec<String>;

/// Marker value written into the `deployment-tool` label by this tool.
pub const DEFAULT_TOOL_MARKER: &str = "cli-fnplan";

/// Prefix of generated schedule topics.
pub const DEFAULT_TOPIC_PREFIX: &str = "deployment-schedule";

/// Decides whether a function name is selected by a filter.
#[cfg_attr(test, mockall::automock)]
pub trait FunctionFilter {
    /// Returns true if `name` is selected by at least one group.
    ///
    /// An empty group list selects everything.
    fn matches_any_group(&self, name: &str, groups: &[FilterGroup]) -> bool;
}

/// Derives the topic a scheduled function is wired to.
#[cfg_attr(test, mockall::automock)]
pub trait TopicNamer {
    /// Returns the topic identifier for a fully qualified function name.
    fn topic_name(&self, function_name: &str) -> String;
}

/// Decides whether a backend record is managed by this tool.
#[cfg_attr(test, mockall::automock)]
pub trait OwnershipCheck {
    /// Returns true if the labels mark the record as created by this tool.
    fn is_managed(&self, labels: &HashMap<String, String>) -> bool;
}

/// Matches function ids against dash-separated name chunks.
///
/// The group `["api", "v2"]` selects `api-v2` and `api-v2-read`, not `api-v3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameChunkFilter;

impl NameChunkFilter {
    /// Returns true if the function id starts with the group's chunks.
    #[must_use]
    pub fn matches_group(name: &str, group: &[String]) -> bool {
        let mut chunks = function_id(name).split('-');
        group.iter().all(|expected| chunks.next() == Some(expected.as_str()))
    }
}

impl FunctionFilter for NameChunkFilter {
    fn matches_any_group(&self, name: &str, groups: &[FilterGroup]) -> bool {
        groups.is_empty() || groups.iter().any(|group| Self::matches_group(name, group))
    }
}

/// Names schedule topics after the function and its region.
#[derive(Debug, Clone)]
pub struct ScheduleTopicNamer {
    prefix: String,
}

impl ScheduleTopicNamer {
    /// Creates a namer with a custom topic prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ScheduleTopicNamer {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX)
    }
}

impl TopicNamer for ScheduleTopicNamer {
    fn topic_name(&self, function_name: &str) -> String {
        match QualifiedName::parse(function_name) {
            Some(q) => format!(
                "projects/{}/topics/{}-{}-{}",
                q.project, self.prefix, q.function, q.region
            ),
            None => format!("{}-{}", self.prefix, function_id(function_name)),
        }
    }
}

/// Recognizes records whose `deployment-tool` label starts with a marker.
#[derive(Debug, Clone)]
pub struct LabelOwnership {
    marker: String,
}

impl LabelOwnership {
    /// Creates an ownership check for a custom tool marker.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for LabelOwnership {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_MARKER)
    }
}

impl OwnershipCheck for LabelOwnership {
    fn is_managed(&self, labels: &HashMap<String, String>) -> bool {
        labels
            .get(DEPLOYMENT_TOOL_LABEL)
            .is_some_and(|tool| tool.starts_with(&self.marker))
    }
}

/// Parses an `--only` selector into filter groups.
///
/// `functions:api,functions:jobs.nightly,hosting` yields `[["api"], ["jobs", "nightly"]]`.
/// Targets other than `functions` are ignored; `None` yields no groups.
#[must_use]
pub fn parse_filter_groups(only: Option<&str>) -> Vec<FilterGroup> {
    let Some(only) = only else {
        return Vec::new();
    };

    only.split(',')
        .filter_map(|target| {
            let (kind, selector) = target.trim().split_once(':')?;
            (kind == "functions" && !selector.is_empty()).then_some(selector)
        })
        .map(|selector| {
            selector
                .split(['.', '-'])
                .map(String::from)
                .collect::<FilterGroup>()
        })
        .collect()
}
