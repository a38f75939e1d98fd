//! Source hashing for change detection.
//!
//! This module provides deterministic hashing of function sources so two
//! planning runs can be recognized as working from the same input.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::spec::{FunctionDefinition, SourceConfig};

/// Hasher for computing source fingerprints.
#[derive(Debug, Default)]
pub struct SourceHasher;

impl SourceHasher {
    /// Creates a new source hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of the entire function source.
    ///
    /// This hash changes when any part of the source changes.
    #[must_use]
    pub fn hash_source(&self, config: &SourceConfig) -> String {
        let mut hasher = Sha256::new();

        hasher.update(config.project.as_bytes());

        for function in &config.functions {
            hasher.update(self.hash_function(function).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash for a single function definition.
    #[must_use]
    pub fn hash_function(&self, function: &FunctionDefinition) -> String {
        let mut hasher = Sha256::new();

        // Identity and placement
        field(&mut hasher, "name", &function.name);
        if let Some(regions) = &function.regions {
            for region in regions {
                field(&mut hasher, "region", region);
            }
        }

        // Maps, sorted for determinism
        sorted_map(&mut hasher, "label", &function.labels);
        sorted_map(&mut hasher, "env", &function.environment_variables);

        // Runtime settings
        optional(&mut hasher, "entryPoint", function.entry_point.as_deref());
        optional(&mut hasher, "runtime", function.runtime.as_deref());
        optional(&mut hasher, "timeout", function.timeout.as_deref());
        optional(&mut hasher, "vpcConnector", function.vpc_connector.as_deref());
        optional(
            &mut hasher,
            "vpcConnectorEgressSettings",
            function.vpc_connector_egress_settings.as_deref(),
        );
        optional(&mut hasher, "ingressSettings", function.ingress_settings.as_deref());
        optional(
            &mut hasher,
            "serviceAccountEmail",
            function.service_account_email.as_deref(),
        );
        if let Some(memory) = function.available_memory_mb {
            hasher.update(b"memory");
            hasher.update(memory.to_be_bytes());
        }
        if let Some(max) = function.max_instances {
            hasher.update(b"maxInstances");
            hasher.update(max.to_be_bytes());
        }
        if let Some(min) = function.min_instances {
            hasher.update(b"minInstances");
            hasher.update(min.to_be_bytes());
        }

        // Triggers
        if let Some(https) = &function.https_trigger {
            hasher.update(b"https");
            optional(&mut hasher, "securityLevel", https.security_level.as_deref());
        }
        if let Some(event) = &function.event_trigger {
            field(&mut hasher, "eventType", &event.event_type);
            field(&mut hasher, "resource", &event.resource);
            optional(&mut hasher, "service", event.service.as_deref());
            if let Some(policy) = &event.failure_policy {
                field(&mut hasher, "failurePolicy", &policy.to_string());
            }
        }

        // Schedule
        if let Some(schedule) = &function.schedule {
            field(&mut hasher, "schedule", &schedule.schedule);
            if let Some(retry) = &schedule.retry_config {
                if let Some(count) = retry.retry_count {
                    hasher.update(b"retryCount");
                    hasher.update(count.to_be_bytes());
                }
                optional(&mut hasher, "maxRetryDuration", retry.max_retry_duration.as_deref());
                optional(&mut hasher, "minBackoff", retry.min_backoff_duration.as_deref());
                optional(&mut hasher, "maxBackoff", retry.max_backoff_duration.as_deref());
                if let Some(doublings) = retry.max_doublings {
                    hasher.update(b"maxDoublings");
                    hasher.update(doublings.to_be_bytes());
                }
            }
        }
        optional(&mut hasher, "timeZone", function.time_zone.as_deref());

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

/// Feeds a tagged, length-prefixed field so adjacent values cannot collide.
fn field(hasher: &mut Sha256, tag: &str, value: &str) {
    hasher.update(tag.as_bytes());
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn optional(hasher: &mut Sha256, tag: &str, value: Option<&str>) {
    if let Some(value) = value {
        field(hasher, tag, value);
    }
}

fn sorted_map(hasher: &mut Sha256, tag: &str, map: &HashMap<String, String>) {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        field(hasher, tag, key);
        field(hasher, tag, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_function(name: &str) -> FunctionDefinition {
        let mut function = FunctionDefinition::https(name);
        function.runtime = Some(String::from("nodejs20"));
        function
            .environment_variables
            .insert(String::from("A"), String::from("1"));
        function
            .environment_variables
            .insert(String::from("B"), String::from("2"));
        function
    }

    #[test]
    fn test_function_hash_deterministic() {
        let hasher = SourceHasher::new();

        let hash1 = hasher.hash_function(&create_test_function("api"));
        let hash2 = hasher.hash_function(&create_test_function("api"));

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_different_functions_different_hash() {
        let hasher = SourceHasher::new();

        let hash1 = hasher.hash_function(&create_test_function("api"));
        let hash2 = hasher.hash_function(&create_test_function("worker"));

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_field_boundaries_do_not_collide() {
        let hasher = SourceHasher::new();
        let mut a = FunctionDefinition::https("api");
        a.entry_point = Some(String::from("ab"));
        a.runtime = Some(String::from("c"));
        let mut b = FunctionDefinition::https("api");
        b.entry_point = Some(String::from("a"));
        b.runtime = Some(String::from("bc"));

        assert_ne!(hasher.hash_function(&a), hasher.hash_function(&b));
    }

    #[test]
    fn test_source_hash_changes_with_project() {
        let hasher = SourceHasher::new();
        let mut source = SourceConfig {
            project: String::from("demo"),
            functions: vec![create_test_function("api")],
        };
        let before = hasher.hash_source(&source);
        source.project = String::from("demo-2");

        assert_ne!(before, hasher.hash_source(&source));
    }

    #[test]
    fn test_short_hash() {
        let hasher = SourceHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
    }
}
