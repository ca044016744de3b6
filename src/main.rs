mod commands;
mod error;
mod graph;
mod output;
mod plan;
mod render;

use clap::{Parser, Subcommand};
use commands::{GraphCommand, GraphFlags, SummaryCommand};

#[derive(Parser)]
#[command(name = "tfgraph")]
#[command(about = "Visualize Terraform/OpenTofu plan dependency graphs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a plan's dependency graph as a diagram
    Graph {
        /// Path to the plan JSON file (from `terraform show -json`)
        plan_file: String,

        /// Output format: graphviz, mermaid or plantuml (dot is an alias
        /// for graphviz)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the diagram to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Group nodes by: module, action or resource_type
        #[arg(short, long)]
        group_by: Option<String>,

        /// Exclude data sources from the graph
        #[arg(long)]
        no_data_sources: bool,

        /// Exclude outputs from the graph
        #[arg(long)]
        no_outputs: bool,

        /// Exclude variables from the graph
        #[arg(long)]
        no_variables: bool,

        /// Exclude local values from the graph
        #[arg(long)]
        no_locals: bool,

        /// Omit per-node change detail
        #[arg(long)]
        compact: bool,

        /// Print diagnostic messages to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a summary report of a plan's changes
    Summary {
        /// Path to the plan JSON file (from `terraform show -json`)
        plan_file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Graph {
            plan_file,
            format,
            output,
            group_by,
            no_data_sources,
            no_outputs,
            no_variables,
            no_locals,
            compact,
            verbose,
        } => GraphCommand::execute(
            &plan_file,
            format.as_deref(),
            output.as_deref(),
            group_by.as_deref(),
            GraphFlags {
                no_data_sources,
                no_outputs,
                no_variables,
                no_locals,
                compact,
                verbose,
            },
        ),
        Commands::Summary { plan_file } => SummaryCommand::execute(&plan_file),
    };

    if let Err(err) = result {
        output::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
