//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! plans, region maps and validation results in text or JSON.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{SourceConfig, SourceHasher, ValidationResult};
use crate::planner::{ActionType, DeploymentPlan, RegionMap};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Function")]
    function: String,
}

/// Region map row for table display.
#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Trigger")]
    trigger: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a deployment plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &DeploymentPlan, source_hash: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::new(plan, source_hash, Utc::now()))
                    .unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan, source_hash),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &DeploymentPlan, source_hash: &str) -> String {
        if plan.is_empty() {
            return format!(
                "{} No changes required - functions are up to date.\n",
                "✓".green()
            );
        }

        let mut output = String::new();

        let _ = write!(output, "\nDeployment Plan\n");
        let _ = write!(
            output,
            "   Source hash: {}\n\n",
            SourceHasher::new().short_hash(source_hash)
        );

        let rows: Vec<PlanActionRow> = plan
            .actions()
            .into_iter()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_type(a.action_type),
                region: a.region.unwrap_or_else(|| String::from("-")),
                function: a.resource_name,
            })
            .collect();

        if !rows.is_empty() {
            let table = Table::new(rows).to_string();
            output.push_str(&table);
            output.push('\n');
        }

        let _ = write!(
            output,
            "\nPlan: {} to create, {} to update, {} to delete\n",
            plan.create_count().to_string().green(),
            plan.update_count().to_string().yellow(),
            plan.delete_count().to_string().red()
        );
        let _ = writeln!(
            output,
            "Schedules: {} to create or update, {} to delete",
            plan.schedule_upsert_count().to_string().green(),
            plan.schedule_delete_count().to_string().red()
        );

        output
    }

    /// Formats a region map for display.
    #[must_use]
    pub fn format_regions(&self, map: &RegionMap) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(map).unwrap_or_default(),
            OutputFormat::Text => {
                if map.is_empty() {
                    return String::from("No functions defined.\n");
                }

                let rows: Vec<RegionRow> = map
                    .iter()
                    .flat_map(|(region, records)| {
                        records.iter().map(move |record| RegionRow {
                            region: region.to_string(),
                            function: record.name.clone(),
                            trigger: record.trigger_kind().to_string(),
                        })
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                let _ = write!(
                    output,
                    "\n\n{} function(s) across {} region(s)\n",
                    map.function_count(),
                    map.len()
                );
                output
            }
        }
    }

    /// Formats a validation result with a source summary.
    #[must_use]
    pub fn format_validation(
        &self,
        source: &SourceConfig,
        result: &ValidationResult,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "project": source.project,
                "functions": source.functions.len(),
                "scheduled": source.scheduled_count(),
                "valid": result.is_valid(),
                "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Function source is valid!\n", "✓".green())
                } else {
                    let mut output = format!("{} Function source is invalid:\n", "✗".red());
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                    output
                };

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output.push_str("\nSource summary:\n");
                let _ = writeln!(output, "   Project: {}", source.project);
                let _ = writeln!(output, "   Functions: {}", source.functions.len());
                let _ = writeln!(output, "   Scheduled: {}", source.scheduled_count());
                output
            }
        }
    }

    /// Formats an action type with color.
    fn format_action_type(action_type: ActionType) -> String {
        match action_type {
            ActionType::CreateFunction => "+create".green().to_string(),
            ActionType::UpdateFunction => "~update".yellow().to_string(),
            ActionType::UpsertSchedule => "~schedule".cyan().to_string(),
            ActionType::DeleteFunction => "-delete".red().to_string(),
            ActionType::DeleteSchedule => "-unschedule".red().to_string(),
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanJson<'a> {
    source_hash: &'a str,
    generated_at: DateTime<Utc>,
    creates: usize,
    updates: usize,
    deletes: usize,
    #[serde(flatten)]
    plan: &'a DeploymentPlan,
}

impl<'a> PlanJson<'a> {
    fn new(plan: &'a DeploymentPlan, source_hash: &'a str, generated_at: DateTime<Utc>) -> Self {
        Self {
            source_hash,
            generated_at,
            creates: plan.create_count(),
            updates: plan.update_count(),
            deletes: plan.delete_count(),
            plan,
        }
    }
}
