//! Deployment planner: diffs desired regional records against the backend.
//!
//! Name equality is the only identity between desired and existing records.
//! Each region is planned independently; existing records matched in one
//! region are taken out of the working set, and whatever is left at the end
//! is a deletion candidate.

use tracing::{debug, info};

use crate::config::FunctionDefinition;
use crate::error::{PlanError, Result};

use super::collaborators::{
    FilterGroup, FunctionFilter, LabelOwnership, NameChunkFilter, OwnershipCheck,
    ScheduleTopicNamer, TopicNamer,
};
use super::plan::{DeploymentPlan, RegionalDeployment};
use super::regions::RegionMap;

/// Planner for computing deployment plans.
pub struct DeploymentPlanner {
    /// Filter-match predicate.
    filter: Box<dyn FunctionFilter>,
    /// Schedule topic deriver.
    topics: Box<dyn TopicNamer>,
    /// Ownership check gating deletion.
    ownership: Box<dyn OwnershipCheck>,
}

impl Default for DeploymentPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeploymentPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentPlanner").finish_non_exhaustive()
    }
}

impl DeploymentPlanner {
    /// Creates a planner with the default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filter: Box::new(NameChunkFilter),
            topics: Box::new(ScheduleTopicNamer::default()),
            ownership: Box::new(LabelOwnership::default()),
        }
    }

    /// Replaces the filter-match predicate.
    #[must_use]
    pub fn with_filter(mut self, filter: impl FunctionFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Replaces the schedule topic deriver.
    #[must_use]
    pub fn with_topic_namer(mut self, topics: impl TopicNamer + 'static) -> Self {
        self.topics = Box::new(topics);
        self
    }

    /// Replaces the ownership check.
    #[must_use]
    pub fn with_ownership(mut self, ownership: impl OwnershipCheck + 'static) -> Self {
        self.ownership = Box::new(ownership);
        self
    }

    /// Computes the deployment plan.
    ///
    /// The desired records are consumed: scheduled records have their trigger
    /// resource rewritten before they are enqueued. `existing` is only read.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::ScheduleWithoutEventTrigger` if a selected scheduled
    /// record has no event trigger. Returns `PlanError::ConflictingOperations`
    /// only when the same desired name appears twice in one region; region
    /// projection never produces that from distinct local names.
    pub fn plan(
        &self,
        desired: RegionMap,
        existing: &[FunctionDefinition],
        filters: &[FilterGroup],
    ) -> Result<DeploymentPlan> {
        let mut plan = DeploymentPlan::default();
        let mut remaining: Vec<&FunctionDefinition> = existing.iter().collect();

        for (region, functions) in desired {
            let regional = self.plan_region(
                region,
                functions,
                &mut remaining,
                filters,
                &mut plan.schedules_to_delete,
            )?;
            plan.regional_deployments.push(regional);
        }

        self.plan_deletions(&remaining, filters, &mut plan);

        plan.verify()?;

        info!(
            "Plan: {} to create, {} to update, {} to delete, {} schedule(s) to upsert, {} schedule(s) to delete",
            plan.create_count(),
            plan.update_count(),
            plan.delete_count(),
            plan.schedule_upsert_count(),
            plan.schedule_delete_count()
        );

        Ok(plan)
    }

    /// Plans a single region, removing matched records from `remaining`.
    fn plan_region(
        &self,
        region: String,
        functions: Vec<FunctionDefinition>,
        remaining: &mut Vec<&FunctionDefinition>,
        filters: &[FilterGroup],
        schedules_to_delete: &mut Vec<String>,
    ) -> Result<RegionalDeployment> {
        let mut regional = RegionalDeployment::new(region);

        for mut function in functions {
            if !self.filter.matches_any_group(&function.name, filters) {
                debug!("Skipping {}: not selected by filters", function.name);
                continue;
            }

            let matching = remaining
                .iter()
                .find(|existing| existing.name == function.name)
                .copied();
            remaining.retain(|existing| existing.name != function.name);
            let was_scheduled = matching.is_some_and(FunctionDefinition::is_labeled_scheduled);

            if function.schedule.is_some() {
                let topic = self.topics.topic_name(&function.name);
                let Some(trigger) = function.event_trigger.as_mut() else {
                    return Err(PlanError::ScheduleWithoutEventTrigger {
                        function: function.name,
                    }
                    .into());
                };
                trigger.resource = topic;

                debug!("Scheduling {} on {}", function.name, trigger.resource);
                regional.schedules_to_create_or_update.push(function.clone());
            } else if was_scheduled {
                if let Some(existing) = matching {
                    debug!("Unscheduling {}: schedule removed from source", existing.name);
                    schedules_to_delete.push(existing.name.clone());
                }
            }

            if matching.is_some() {
                debug!("Updating {}", function.name);
                regional.functions_to_update.push(function);
            } else {
                debug!("Creating {}", function.name);
                regional.functions_to_create.push(function);
            }
        }

        Ok(regional)
    }

    /// Turns leftover existing records into deletions.
    ///
    /// Only records owned by this tool are deleted. A non-empty filter list
    /// additionally limits deletion to selected names; an empty one does not.
    fn plan_deletions(
        &self,
        remaining: &[&FunctionDefinition],
        filters: &[FilterGroup],
        plan: &mut DeploymentPlan,
    ) {
        let owned = remaining
            .iter()
            .filter(|existing| self.ownership.is_managed(&existing.labels));

        let doomed: Vec<&FunctionDefinition> = if filters.is_empty() {
            owned.copied().collect()
        } else {
            owned
                .filter(|existing| self.filter.matches_any_group(&existing.name, filters))
                .copied()
                .collect()
        };

        for existing in doomed {
            debug!("Deleting {}", existing.name);
            plan.functions_to_delete.push(existing.name.clone());

            if existing.is_labeled_scheduled() {
                plan.schedules_to_delete.push(existing.name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DEPLOYMENT_TOOL_LABEL, EventTrigger, HttpsTrigger, SCHEDULED_LABEL, ScheduleSpec,
    };
    use crate::error::FnplanError;
    use crate::planner::collaborators::{MockFunctionFilter, MockOwnershipCheck, MockTopicNamer};
    use crate::planner::regions::RegionMapper;
    use std::collections::HashMap;

    const PROJECT: &str = "demo";

    fn qualified(region: &str, id: &str) -> String {
        format!("projects/{PROJECT}/locations/{region}/functions/{id}")
    }

    fn desired(name: &str, regions: &[&str]) -> FunctionDefinition {
        let mut def = FunctionDefinition::https(name);
        if !regions.is_empty() {
            def.regions = Some(regions.iter().map(|r| (*r).to_string()).collect());
        }
        def
    }

    fn scheduled(name: &str) -> FunctionDefinition {
        FunctionDefinition {
            name: name.to_string(),
            event_trigger: Some(EventTrigger {
                event_type: String::from("google.pubsub.topic.publish"),
                resource: String::from("placeholder"),
                ..EventTrigger::default()
            }),
            schedule: Some(ScheduleSpec {
                schedule: String::from("every 5 minutes"),
                retry_config: None,
            }),
            ..FunctionDefinition::default()
        }
    }

    fn existing(region: &str, id: &str, owned: bool, scheduled: bool) -> FunctionDefinition {
        let mut labels = HashMap::new();
        if owned {
            labels.insert(DEPLOYMENT_TOOL_LABEL.to_string(), String::from("cli-fnplan"));
        }
        if scheduled {
            labels.insert(SCHEDULED_LABEL.to_string(), String::from("true"));
        }
        FunctionDefinition {
            name: qualified(region, id),
            labels,
            https_trigger: Some(HttpsTrigger::default()),
            ..FunctionDefinition::default()
        }
    }

    fn map(definitions: &[FunctionDefinition]) -> RegionMap {
        RegionMapper::new(PROJECT).map(definitions)
    }

    fn group(chunks: &[&str]) -> FilterGroup {
        chunks.iter().map(|c| (*c).to_string()).collect()
    }

    fn names(functions: &[FunctionDefinition]) -> Vec<&str> {
        functions.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_multi_region_create() {
        let plan = DeploymentPlanner::new()
            .plan(map(&[desired("a", &["us-east1", "us-west1"])]), &[], &[])
            .unwrap();

        assert_eq!(plan.create_count(), 2);
        assert_eq!(
            names(&plan.regional("us-east1").unwrap().functions_to_create),
            vec![qualified("us-east1", "a")]
        );
        assert_eq!(
            names(&plan.regional("us-west1").unwrap().functions_to_create),
            vec![qualified("us-west1", "a")]
        );
        assert!(plan.functions_to_delete.is_empty());
        assert!(plan.schedules_to_delete.is_empty());
    }

    #[test]
    fn test_orphan_owned_function_is_deleted() {
        let plan = DeploymentPlanner::new()
            .plan(RegionMap::default(), &[existing("us-central1", "a", true, false)], &[])
            .unwrap();

        assert_eq!(plan.functions_to_delete, vec![qualified("us-central1", "a")]);
        assert!(plan.schedules_to_delete.is_empty());
    }

    #[test]
    fn test_scheduled_function_created_with_topic() {
        let plan = DeploymentPlanner::new()
            .plan(map(&[scheduled("b")]), &[], &[])
            .unwrap();

        let regional = plan.regional("us-central1").unwrap();
        let expected_topic = "projects/demo/topics/deployment-schedule-b-us-central1";
        assert_eq!(regional.schedules_to_create_or_update.len(), 1);
        assert_eq!(regional.functions_to_create.len(), 1);
        for record in regional
            .schedules_to_create_or_update
            .iter()
            .chain(&regional.functions_to_create)
        {
            assert_eq!(record.name, qualified("us-central1", "b"));
            assert_eq!(record.event_trigger.as_ref().unwrap().resource, expected_topic);
        }
    }

    #[test]
    fn test_existing_match_is_updated_not_deleted() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[desired("api", &[])]),
                &[existing("us-central1", "api", true, false)],
                &[],
            )
            .unwrap();

        let regional = plan.regional("us-central1").unwrap();
        assert!(regional.functions_to_create.is_empty());
        assert_eq!(names(&regional.functions_to_update), vec![qualified("us-central1", "api")]);
        assert!(plan.functions_to_delete.is_empty());
    }

    #[test]
    fn test_same_id_in_other_region_is_not_a_match() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[desired("api", &["us-east1"])]),
                &[existing("us-central1", "api", true, false)],
                &[],
            )
            .unwrap();

        assert_eq!(plan.create_count(), 1);
        assert_eq!(plan.update_count(), 0);
        assert_eq!(plan.functions_to_delete, vec![qualified("us-central1", "api")]);
    }

    #[test]
    fn test_unowned_function_is_never_deleted() {
        let plan = DeploymentPlanner::new()
            .plan(
                RegionMap::default(),
                &[existing("us-central1", "manual", false, true)],
                &[],
            )
            .unwrap();

        assert!(plan.functions_to_delete.is_empty());
        assert!(plan.schedules_to_delete.is_empty());
    }

    #[test]
    fn test_deleted_scheduled_function_deletes_schedule() {
        let plan = DeploymentPlanner::new()
            .plan(
                RegionMap::default(),
                &[existing("us-central1", "nightly", true, true)],
                &[],
            )
            .unwrap();

        assert_eq!(plan.functions_to_delete, vec![qualified("us-central1", "nightly")]);
        assert_eq!(plan.schedules_to_delete, vec![qualified("us-central1", "nightly")]);
    }

    #[test]
    fn test_dropped_schedule_is_deleted_once() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[desired("nightly", &[])]),
                &[existing("us-central1", "nightly", true, true)],
                &[],
            )
            .unwrap();

        assert_eq!(plan.schedules_to_delete, vec![qualified("us-central1", "nightly")]);
        assert_eq!(plan.update_count(), 1);
        assert!(plan.functions_to_delete.is_empty());
        assert_eq!(plan.schedule_upsert_count(), 0);
    }

    #[test]
    fn test_kept_schedule_is_upserted_not_deleted() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[scheduled("nightly")]),
                &[existing("us-central1", "nightly", true, true)],
                &[],
            )
            .unwrap();

        assert!(plan.schedules_to_delete.is_empty());
        assert_eq!(plan.schedule_upsert_count(), 1);
        assert_eq!(plan.update_count(), 1);

        let regional = plan.regional("us-central1").unwrap();
        let expected_topic = "projects/demo/topics/deployment-schedule-nightly-us-central1";
        for record in regional
            .functions_to_update
            .iter()
            .chain(&regional.schedules_to_create_or_update)
        {
            assert_eq!(record.name, qualified("us-central1", "nightly"));
            assert_eq!(record.event_trigger.as_ref().unwrap().resource, expected_topic);
        }
    }

    #[test]
    fn test_duplicate_existing_names_are_all_matched() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[desired("api", &[])]),
                &[
                    existing("us-central1", "api", true, false),
                    existing("us-central1", "api", true, false),
                    existing("us-central1", "old", true, false),
                ],
                &[],
            )
            .unwrap();

        assert_eq!(plan.update_count(), 1);
        assert_eq!(plan.create_count(), 0);
        assert_eq!(plan.functions_to_delete, vec![qualified("us-central1", "old")]);
    }

    #[test]
    fn test_filtered_out_desired_function_is_skipped() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[desired("api", &[]), desired("worker", &[])]),
                &[existing("us-central1", "worker", true, false)],
                &[group(&["api"])],
            )
            .unwrap();

        let regional = plan.regional("us-central1").unwrap();
        assert_eq!(names(&regional.functions_to_create), vec![qualified("us-central1", "api")]);
        assert!(regional.functions_to_update.is_empty());
        // worker is outside the filter, so it is neither updated nor deleted
        assert!(plan.functions_to_delete.is_empty());
    }

    #[test]
    fn test_scoped_deploy_only_deletes_within_filter() {
        let orphans = [
            existing("us-central1", "api-old", true, false),
            existing("us-central1", "worker", true, false),
        ];

        let scoped = DeploymentPlanner::new()
            .plan(RegionMap::default(), &orphans, &[group(&["api"])])
            .unwrap();
        assert_eq!(scoped.functions_to_delete, vec![qualified("us-central1", "api-old")]);

        let unscoped = DeploymentPlanner::new()
            .plan(RegionMap::default(), &orphans, &[])
            .unwrap();
        assert_eq!(
            unscoped.functions_to_delete,
            vec![qualified("us-central1", "api-old"), qualified("us-central1", "worker")]
        );
    }

    #[test]
    fn test_schedule_without_event_trigger_fails_fast() {
        let mut def = scheduled("nightly");
        def.event_trigger = None;

        let result = DeploymentPlanner::new().plan(map(&[def]), &[], &[]);
        match result {
            Err(FnplanError::Plan(PlanError::ScheduleWithoutEventTrigger { function })) => {
                assert_eq!(function, qualified("us-central1", "nightly"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_desired_names_are_rejected() {
        let desired_map: RegionMap = [
            (String::from("us-east1"), FunctionDefinition::https(qualified("us-east1", "a"))),
            (String::from("us-east1"), FunctionDefinition::https(qualified("us-east1", "a"))),
        ]
        .into_iter()
        .collect();

        let result = DeploymentPlanner::new().plan(
            desired_map,
            &[existing("us-east1", "a", true, false)],
            &[],
        );
        assert!(matches!(
            result,
            Err(FnplanError::Plan(PlanError::ConflictingOperations { .. }))
        ));
    }

    #[test]
    fn test_plan_names_are_qualified_and_regional() {
        let plan = DeploymentPlanner::new()
            .plan(
                map(&[
                    desired("a", &["us-east1", "europe-west1"]),
                    desired("b", &[]),
                    scheduled("c"),
                ]),
                &[
                    existing("us-east1", "a", true, false),
                    existing("asia-east2", "gone", true, true),
                ],
                &[],
            )
            .unwrap();

        for regional in &plan.regional_deployments {
            for record in regional
                .functions_to_create
                .iter()
                .chain(&regional.functions_to_update)
            {
                assert_eq!(record.region(), Some(regional.region.as_str()));
                assert!(record.regions.is_none());
            }
        }
        assert_eq!(plan.functions_to_delete, vec![qualified("asia-east2", "gone")]);
        assert_eq!(plan.schedules_to_delete, vec![qualified("asia-east2", "gone")]);
    }

    #[test]
    fn test_existing_input_is_not_modified() {
        let existing_records = vec![existing("us-central1", "nightly", true, true)];
        let snapshot = existing_records.clone();

        let _ = DeploymentPlanner::new()
            .plan(map(&[scheduled("nightly")]), &existing_records, &[])
            .unwrap();

        assert_eq!(existing_records, snapshot);
    }

    #[test]
    fn test_injected_topic_namer_is_used_only_for_scheduled_functions() {
        let mut topics = MockTopicNamer::new();
        topics
            .expect_topic_name()
            .withf(|name| name == "projects/demo/locations/us-central1/functions/nightly")
            .times(1)
            .returning(|_| String::from("custom-topic"));

        let plan = DeploymentPlanner::new()
            .with_topic_namer(topics)
            .plan(map(&[scheduled("nightly"), desired("api", &[])]), &[], &[])
            .unwrap();

        let regional = plan.regional("us-central1").unwrap();
        assert_eq!(
            regional.schedules_to_create_or_update[0]
                .event_trigger
                .as_ref()
                .unwrap()
                .resource,
            "custom-topic"
        );
    }

    #[test]
    fn test_injected_filter_receives_groups() {
        let mut filter = MockFunctionFilter::new();
        filter
            .expect_matches_any_group()
            .withf(|_, groups| groups.len() == 1 && groups[0] == ["keep"])
            .returning(|name, _| name.ends_with("/keep"));

        let plan = DeploymentPlanner::new()
            .with_filter(filter)
            .plan(
                map(&[desired("keep", &[]), desired("drop", &[])]),
                &[existing("us-central1", "old", true, false)],
                &[group(&["keep"])],
            )
            .unwrap();

        assert_eq!(plan.create_count(), 1);
        assert!(plan.functions_to_delete.is_empty());
    }

    #[test]
    fn test_filter_not_consulted_for_unscoped_deletes() {
        let mut filter = MockFunctionFilter::new();
        filter.expect_matches_any_group().times(0);

        let plan = DeploymentPlanner::new()
            .with_filter(filter)
            .plan(
                RegionMap::default(),
                &[existing("us-central1", "old", true, false)],
                &[],
            )
            .unwrap();

        assert_eq!(plan.delete_count(), 1);
    }

    #[test]
    fn test_injected_ownership_gates_deletion() {
        let mut ownership = MockOwnershipCheck::new();
        ownership
            .expect_is_managed()
            .times(2)
            .returning(|labels| labels.contains_key("team"));

        let mut team_owned = existing("us-central1", "team", false, false);
        team_owned
            .labels
            .insert(String::from("team"), String::from("payments"));

        let plan = DeploymentPlanner::new()
            .with_ownership(ownership)
            .plan(
                RegionMap::default(),
                &[team_owned, existing("us-central1", "tool", true, false)],
                &[],
            )
            .unwrap();

        assert_eq!(plan.functions_to_delete, vec![qualified("us-central1", "team")]);
    }
}
