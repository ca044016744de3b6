//! Graph generation options
//!
//! Format and grouping values arrive as plain strings from the CLI and are
//! validated here, before any plan file is opened.

use std::str::FromStr;

use crate::error::GraphError;

/// Output diagram grammar. Parses from "graphviz", "mermaid" or
/// "plantuml"; "dot" is accepted as an alias for graphviz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    #[default]
    Graphviz,
    Mermaid,
    Plantuml,
}

impl FromStr for GraphFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graphviz" | "dot" => Ok(GraphFormat::Graphviz),
            "mermaid" => Ok(GraphFormat::Mermaid),
            "plantuml" => Ok(GraphFormat::Plantuml),
            other => Err(GraphError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Node grouping policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Module,
    Action,
    ResourceType,
}

impl FromStr for GroupBy {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(GroupBy::Module),
            "action" => Ok(GroupBy::Action),
            "resource_type" => Ok(GroupBy::ResourceType),
            other => Err(GraphError::UnsupportedGrouping(other.to_string())),
        }
    }
}

/// Options controlling graph construction and rendering
#[derive(Debug, Clone, Default)]
pub struct GraphOptions {
    pub format: GraphFormat,
    pub group_by: GroupBy,

    /// Exclude data source nodes
    pub no_data_sources: bool,
    /// Exclude output nodes
    pub no_outputs: bool,
    /// Exclude variable nodes
    pub no_variables: bool,
    /// Exclude local value nodes
    pub no_locals: bool,

    /// Omit secondary per-node detail; topology is unaffected
    pub compact: bool,
    /// Emit diagnostic logging to stderr; no effect on graph content
    pub verbose: bool,
}
