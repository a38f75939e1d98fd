//! Function definition types for the deployment planner.
//!
//! This module defines the records that describe a serverless function, both
//! as written in the source file (desired) and as listed by the backend
//! (existing), plus the file-level wrappers around them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Region a definition is deployed to when it names none.
pub const DEFAULT_REGION: &str = "us-central1";

/// Label key identifying the tool that created a backend record.
pub const DEPLOYMENT_TOOL_LABEL: &str = "deployment-tool";

/// Label key marking a backend record as a scheduled function.
pub const SCHEDULED_LABEL: &str = "deployment-scheduled";

/// The root structure of a function source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Project the functions are deployed into.
    pub project: String,
    /// Desired function definitions, with local names.
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

/// Snapshot of the functions currently deployed in the backend.
///
/// Mirrors the shape of a backend list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistingSnapshot {
    /// Existing function records, with fully qualified names.
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

/// A single function record, desired or existing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    /// Local name before region projection, fully qualified afterwards.
    pub name: String,
    /// Target regions; only present on desired records before projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,
    /// Record labels.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    /// Environment variables.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment_variables: HashMap<String, String>,
    /// Exported symbol invoked by the runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    /// Runtime identifier (e.g. "nodejs20").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Memory limit in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_memory_mb: Option<u32>,
    /// Execution timeout (e.g. "60s").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    /// Upper bound on concurrent instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,
    /// Instances kept warm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,
    /// Serverless VPC connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_connector: Option<String>,
    /// Egress settings for the VPC connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_connector_egress_settings: Option<String>,
    /// Ingress settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_settings: Option<String>,
    /// Service account the function runs as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_email: Option<String>,
    /// HTTPS trigger, exclusive with `event_trigger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_trigger: Option<HttpsTrigger>,
    /// Event trigger, exclusive with `https_trigger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_trigger: Option<EventTrigger>,
    /// Schedule descriptor; its presence makes this a scheduled function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSpec>,
    /// Time zone the schedule is evaluated in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// HTTPS trigger descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HttpsTrigger {
    /// Security level (e.g. "SECURE_ALWAYS").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_level: Option<String>,
}

/// Event trigger descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    /// Event type (e.g. "google.pubsub.topic.publish").
    pub event_type: String,
    /// Event source, such as a message topic.
    #[serde(default)]
    pub resource: String,
    /// Service that emits the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Retry policy, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<serde_json::Value>,
}

/// Schedule descriptor for a scheduled function.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    /// Cron expression or "every N minutes" style schedule.
    pub schedule: String,
    /// Retry settings for the scheduler job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<ScheduleRetryConfig>,
}

/// Retry settings for a scheduler job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRetryConfig {
    /// Number of retry attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    /// Time limit for retrying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retry_duration: Option<String>,
    /// Minimum wait between retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_backoff_duration: Option<String>,
    /// Maximum wait between retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_backoff_duration: Option<String>,
    /// Times the wait doubles before growing linearly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_doublings: Option<u32>,
}

/// Components of a fully qualified function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    /// Project identifier.
    pub project: &'a str,
    /// Region identifier.
    pub region: &'a str,
    /// Local function identifier.
    pub function: &'a str,
}

impl<'a> QualifiedName<'a> {
    /// Parses `projects/{project}/locations/{region}/functions/{function}`.
    ///
    /// Returns `None` for names of any other shape.
    #[must_use]
    pub fn parse(name: &'a str) -> Option<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            &["projects", project, "locations", region, "functions", function]
                if !project.is_empty() && !region.is_empty() && !function.is_empty() =>
            {
                Some(Self {
                    project,
                    region,
                    function,
                })
            }
            _ => None,
        }
    }

    /// Formats a fully qualified function name.
    #[must_use]
    pub fn format(project: &str, region: &str, function: &str) -> String {
        format!("projects/{project}/locations/{region}/functions/{function}")
    }
}

impl std::fmt::Display for QualifiedName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/functions/{}",
            self.project, self.region, self.function
        )
    }
}

/// Returns the last path segment of a function name.
#[must_use]
pub fn function_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

impl FunctionDefinition {
    /// Creates an HTTPS-triggered definition with the given name.
    #[must_use]
    pub fn https(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            https_trigger: Some(HttpsTrigger::default()),
            ..Self::default()
        }
    }

    /// Returns the regions this definition targets, falling back to the default region.
    #[must_use]
    pub fn effective_regions(&self) -> Vec<&str> {
        match &self.regions {
            Some(regions) if !regions.is_empty() => regions.iter().map(String::as_str).collect(),
            _ => vec![DEFAULT_REGION],
        }
    }

    /// Returns true if the record's labels mark it as a scheduled function.
    #[must_use]
    pub fn is_labeled_scheduled(&self) -> bool {
        self.labels.get(SCHEDULED_LABEL).is_some_and(|v| v == "true")
    }

    /// Returns true if the definition carries a schedule.
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    /// Returns the region encoded in a fully qualified name.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        QualifiedName::parse(&self.name).map(|q| q.region)
    }

    /// Returns the local identifier of the function.
    #[must_use]
    pub fn function_id(&self) -> &str {
        function_id(&self.name)
    }

    /// Returns a short description of the trigger.
    #[must_use]
    pub fn trigger_kind(&self) -> &'static str {
        if self.schedule.is_some() {
            "schedule"
        } else if self.event_trigger.is_some() {
            "event"
        } else if self.https_trigger.is_some() {
            "https"
        } else {
            "none"
        }
    }
}

impl SourceConfig {
    /// Returns the local function names.
    #[must_use]
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns the number of scheduled functions.
    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.functions.iter().filter(|f| f.is_scheduled()).count()
    }
}
