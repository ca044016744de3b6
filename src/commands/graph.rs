use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::PathBuf;

use crate::graph::{GraphBuilder, GraphFormat, GraphOptions, GroupBy};
use crate::output;
use crate::plan::PlanLoader;
use crate::render::renderer_for;

/// Flag arguments for the graph command
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphFlags {
    pub no_data_sources: bool,
    pub no_outputs: bool,
    pub no_variables: bool,
    pub no_locals: bool,
    pub compact: bool,
    pub verbose: bool,
}

pub struct GraphCommand;

impl GraphCommand {
    /// Execute the graph command: load a plan file, build its dependency
    /// graph and render it in the selected format
    pub fn execute(
        plan_file: &str,
        format: Option<&str>,
        output_file: Option<&str>,
        group_by: Option<&str>,
        flags: GraphFlags,
    ) -> Result<()> {
        // Option values are validated before the plan file is ever opened.
        let format: GraphFormat = format.unwrap_or("graphviz").parse()?;
        let group_by: GroupBy = group_by.unwrap_or("module").parse()?;

        let options = GraphOptions {
            format,
            group_by,
            no_data_sources: flags.no_data_sources,
            no_outputs: flags.no_outputs,
            no_variables: flags.no_variables,
            no_locals: flags.no_locals,
            compact: flags.compact,
            verbose: flags.verbose,
        };

        if options.verbose {
            output::debug(&format!("Loading plan from {}", plan_file));
        }

        let bytes = fs::read(plan_file)
            .with_context(|| format!("Failed to read plan file: {}", plan_file))?;
        let plan = PlanLoader::load(&bytes)?;

        if options.verbose {
            output::debug(&format!(
                "Parsed plan: format_version {}, {} resource changes",
                plan.format_version,
                plan.resource_changes.len()
            ));
        }

        let graph = GraphBuilder::new(&plan, &options).build()?;
        if options.verbose && graph.is_empty() {
            output::debug("Plan produced an empty graph");
        }
        let text = renderer_for(options.format).generate(&graph, &options)?;

        match output_file {
            Some(file) => {
                fs::write(PathBuf::from(file), &text)
                    .with_context(|| format!("Failed to write diagram to: {}", file))?;
                output::success(&format!("Diagram written to: {}", file));
            }
            None => {
                print!("{}", text);
            }
        }

        Ok(())
    }
}
