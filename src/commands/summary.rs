use anyhow::{Context as AnyhowContext, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;

use crate::output;
use crate::plan::{ChangeAction, Plan, PlanLoader};

pub struct SummaryCommand;

impl SummaryCommand {
    /// Execute the summary command: load a plan file and print a styled
    /// change report
    pub fn execute(plan_file: &str) -> Result<()> {
        let bytes = fs::read(plan_file)
            .with_context(|| format!("Failed to read plan file: {}", plan_file))?;
        let plan = PlanLoader::load(&bytes)?;

        output::section("Plan Summary");
        if let Some(version) = &plan.terraform_version {
            output::key_value("Terraform version", version);
        }
        output::key_value(
            "Resource changes",
            &plan.resource_changes.len().to_string(),
        );

        let counts = Self::count_actions(&plan);
        for (action, count) in &counts {
            output::key_value(action.label(), &count.to_string());
        }

        output::blank();
        for rc in &plan.resource_changes {
            let action = rc.change.action();
            if action == ChangeAction::NoOp {
                continue;
            }
            output::dimmed(&format!(
                "{} {} ({})",
                action.symbol(),
                rc.address,
                action.label()
            ));
        }

        let modules = Self::count_modules(&plan);
        if modules.len() > 1 {
            output::blank();
            output::section("Changes by Module");
            for (module, count) in &modules {
                let label = if module.is_empty() { "root" } else { module };
                output::key_value(label, &count.to_string());
            }
        }

        if !plan.output_changes.is_empty() {
            output::blank();
            output::section("Outputs");
            for (name, change) in &plan.output_changes {
                let rendered = match change.value() {
                    Some(value) => value.to_string(),
                    None if change.is_sensitive() => "(sensitive)".to_string(),
                    None => "(unknown)".to_string(),
                };
                output::key_value(name, &rendered);
            }
        }

        if !plan.variables.is_empty() {
            output::blank();
            output::section("Variables");
            for (name, variable) in &plan.variables {
                let rendered = variable
                    .value
                    .as_ref()
                    .map_or_else(|| "(unset)".to_string(), Value::to_string);
                output::key_value(name, &rendered);
            }
        }

        Ok(())
    }

    fn count_actions(plan: &Plan) -> BTreeMap<ChangeAction, usize> {
        let mut counts = BTreeMap::new();
        for rc in &plan.resource_changes {
            *counts.entry(rc.change.action()).or_insert(0) += 1;
        }
        counts
    }

    fn count_modules(plan: &Plan) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for rc in &plan.resource_changes {
            if rc.change.action() == ChangeAction::NoOp {
                continue;
            }
            *counts.entry(rc.module_address.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_actions() {
        let bytes = json!({
            "format_version": "1.2",
            "resource_changes": [
                {
                    "address": "aws_instance.a",
                    "mode": "managed", "type": "aws_instance", "name": "a",
                    "change": {"actions": ["create"]}
                },
                {
                    "address": "aws_instance.b",
                    "mode": "managed", "type": "aws_instance", "name": "b",
                    "change": {"actions": ["delete", "create"]}
                },
                {
                    "address": "module.db.aws_instance.c",
                    "module_address": "module.db",
                    "mode": "managed", "type": "aws_instance", "name": "c",
                    "change": {"actions": ["no-op"]}
                }
            ]
        })
        .to_string()
        .into_bytes();
        let plan = PlanLoader::load(&bytes).unwrap();

        let counts = SummaryCommand::count_actions(&plan);
        assert_eq!(counts.get(&ChangeAction::Create), Some(&1));
        assert_eq!(counts.get(&ChangeAction::Replace), Some(&1));
        assert_eq!(counts.get(&ChangeAction::NoOp), Some(&1));

        let modules = SummaryCommand::count_modules(&plan);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules.get(""), Some(&2));
    }
}
