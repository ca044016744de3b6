//! Abstract dependency graph derived from a plan
//!
//! This module builds the format-independent graph (nodes, edges, group
//! assignments) that the renderers serialize into their diagram grammars.

mod builder;
mod options;
mod resolver;
mod types;

pub use builder::GraphBuilder;
pub use options::{GraphFormat, GraphOptions, GroupBy};
pub use resolver::{DependencyResolver, Resolution};
pub use types::{Edge, EdgeKind, Graph, Node, NodeKind};
