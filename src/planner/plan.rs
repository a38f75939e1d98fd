//! Deployment plan types.
//!
//! A plan holds one fragment per region (functions to create or update,
//! schedules to upsert) plus global delete lists. Deletion only needs
//! identity, so the delete lists hold names rather than full records.

use serde::Serialize;
use std::collections::HashSet;

use crate::config::{FunctionDefinition, QualifiedName};
use crate::error::{PlanError, Result};

/// A complete deployment plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    /// Per-region plan fragments, in region order.
    pub regional_deployments: Vec<RegionalDeployment>,
    /// Fully qualified names of functions to delete.
    pub functions_to_delete: Vec<String>,
    /// Fully qualified names of functions whose schedules must be deleted.
    pub schedules_to_delete: Vec<String>,
}

/// Plan fragment for a single region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalDeployment {
    /// Region identifier.
    pub region: String,
    /// Upload reuse token, set by the executing caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_token: Option<String>,
    /// First function operation started in the region, set by the executing caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_function_deployment: Option<String>,
    /// Functions that do not exist yet.
    pub functions_to_create: Vec<FunctionDefinition>,
    /// Functions that exist and are redeployed.
    pub functions_to_update: Vec<FunctionDefinition>,
    /// Scheduled functions whose scheduler jobs are created or updated.
    pub schedules_to_create_or_update: Vec<FunctionDefinition>,
}

/// A single planned action, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// Region the action runs in, when known.
    pub region: Option<String>,
    /// Fully qualified function name.
    pub resource_name: String,
}

/// Types of actions in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Create a new function.
    CreateFunction,
    /// Redeploy an existing function.
    UpdateFunction,
    /// Create or update a scheduler job.
    UpsertSchedule,
    /// Delete a function.
    DeleteFunction,
    /// Delete a scheduler job.
    DeleteSchedule,
}

impl RegionalDeployment {
    /// Creates an empty fragment for a region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Returns true if the fragment has nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions_to_create.is_empty()
            && self.functions_to_update.is_empty()
            && self.schedules_to_create_or_update.is_empty()
    }
}

impl DeploymentPlan {
    /// Returns true if the plan is empty (no changes).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regional_deployments.iter().all(RegionalDeployment::is_empty)
            && self.functions_to_delete.is_empty()
            && self.schedules_to_delete.is_empty()
    }

    /// Returns the fragment for a region.
    #[must_use]
    pub fn regional(&self, region: &str) -> Option<&RegionalDeployment> {
        self.regional_deployments.iter().find(|r| r.region == region)
    }

    /// Returns the number of functions to create.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.regional_deployments
            .iter()
            .map(|r| r.functions_to_create.len())
            .sum()
    }

    /// Returns the number of functions to update.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.regional_deployments
            .iter()
            .map(|r| r.functions_to_update.len())
            .sum()
    }

    /// Returns the number of schedules to create or update.
    #[must_use]
    pub fn schedule_upsert_count(&self) -> usize {
        self.regional_deployments
            .iter()
            .map(|r| r.schedules_to_create_or_update.len())
            .sum()
    }

    /// Returns the number of functions to delete.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.functions_to_delete.len()
    }

    /// Returns the number of schedules to delete.
    #[must_use]
    pub fn schedule_delete_count(&self) -> usize {
        self.schedules_to_delete.len()
    }

    /// Flattens the plan into actions.
    ///
    /// Regional actions come first, in region order, followed by deletes.
    #[must_use]
    pub fn actions(&self) -> Vec<PlannedAction> {
        let mut actions = Vec::new();

        for regional in &self.regional_deployments {
            let groups = [
                (ActionType::CreateFunction, &regional.functions_to_create),
                (ActionType::UpdateFunction, &regional.functions_to_update),
                (ActionType::UpsertSchedule, &regional.schedules_to_create_or_update),
            ];
            for (action_type, functions) in groups {
                actions.extend(functions.iter().map(|f| PlannedAction {
                    action_type,
                    region: Some(regional.region.clone()),
                    resource_name: f.name.clone(),
                }));
            }
        }

        let deletes = [
            (ActionType::DeleteFunction, &self.functions_to_delete),
            (ActionType::DeleteSchedule, &self.schedules_to_delete),
        ];
        for (action_type, names) in deletes {
            actions.extend(names.iter().map(|name| PlannedAction {
                action_type,
                region: QualifiedName::parse(name).map(|q| q.region.to_string()),
                resource_name: name.clone(),
            }));
        }

        actions
    }

    /// Checks that no function or schedule is the target of conflicting operations.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::ConflictingOperations` describing the first conflict found.
    pub fn verify(&self) -> Result<()> {
        let mut deployed = HashSet::new();
        let mut upserted = HashSet::new();

        for regional in &self.regional_deployments {
            for function in regional
                .functions_to_create
                .iter()
                .chain(&regional.functions_to_update)
            {
                if !deployed.insert(function.name.as_str()) {
                    return Err(PlanError::conflict(format!(
                        "'{}' is deployed more than once",
                        function.name
                    ))
                    .into());
                }
            }
            upserted.extend(
                regional
                    .schedules_to_create_or_update
                    .iter()
                    .map(|f| f.name.as_str()),
            );
        }

        if let Some(name) = self
            .functions_to_delete
            .iter()
            .find(|name| deployed.contains(name.as_str()))
        {
            return Err(PlanError::conflict(format!("'{name}' is both deployed and deleted")).into());
        }

        if let Some(name) = self
            .schedules_to_delete
            .iter()
            .find(|name| upserted.contains(name.as_str()))
        {
            return Err(PlanError::conflict(format!(
                "schedule for '{name}' is both upserted and deleted"
            ))
            .into());
        }

        Ok(())
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CreateFunction => "create",
            Self::UpdateFunction => "update",
            Self::UpsertSchedule => "schedule",
            Self::DeleteFunction => "delete",
            Self::DeleteSchedule => "unschedule",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.action_type, self.resource_name)
    }
}

impl std::fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes required");
        }

        let actions = self.actions();
        writeln!(f, "Deployment Plan ({} actions):", actions.len())?;
        for (i, action) in actions.iter().enumerate() {
            writeln!(f, "  {i}. {action}")?;
        }

        Ok(())
    }
}
