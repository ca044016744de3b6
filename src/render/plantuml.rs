//! PlantUML renderer
//!
//! Emits a deployment-style diagram with one package per group key; nested
//! module addresses become nested packages.

use crate::error::GraphError;
use crate::graph::{EdgeKind, Graph, GraphOptions, Node, NodeKind};

use super::style::{GroupNode, group_tree, label_lines, sanitize_id, style_class};
use super::Renderer;

pub struct PlantumlRenderer;

impl Renderer for PlantumlRenderer {
    fn generate(&self, graph: &Graph, options: &GraphOptions) -> Result<String, GraphError> {
        let mut out = String::new();
        out.push_str("@startuml\n");
        out.push_str("skinparam shadowing false\n");
        out.push_str("skinparam defaultTextAlignment center\n");
        out.push_str("left to right direction\n");

        let groups = graph.groups();
        let tree = group_tree(&groups, options.group_by);
        for group in &tree {
            Self::write_package(&mut out, graph, options, group, 0);
        }

        if !graph.edges.is_empty() {
            out.push('\n');
        }
        for edge in &graph.edges {
            match edge.kind {
                EdgeKind::Dependency => {
                    out.push_str(&format!("{} --> {}\n", edge.source, edge.target));
                }
                EdgeKind::DataFlow => {
                    out.push_str(&format!("{} ..> {}\n", edge.source, edge.target));
                }
            }
        }

        out.push_str("@enduml\n");
        Ok(out)
    }
}

impl PlantumlRenderer {
    fn write_package(
        out: &mut String,
        graph: &Graph,
        options: &GraphOptions,
        group: &GroupNode,
        depth: usize,
    ) {
        let pad = "  ".repeat(depth);
        let alias_key = if group.key.is_empty() { "root" } else { &group.key };

        out.push_str(&format!(
            "\n{}package \"{}\" as g_{} {{\n",
            pad,
            escape(&group.label),
            sanitize_id(alias_key)
        ));

        for node in graph.nodes_in_group(&group.key) {
            Self::write_node(out, node, options, depth + 1);
        }

        for child in &group.children {
            Self::write_package(out, graph, options, child, depth + 1);
        }

        out.push_str(&format!("{}}}\n", pad));
    }

    fn write_node(out: &mut String, node: &Node, options: &GraphOptions, depth: usize) {
        let pad = "  ".repeat(depth);
        let style = style_class(node.action);
        let label = label_lines(node, options.compact)
            .iter()
            .map(|line| escape(line))
            .collect::<Vec<_>>()
            .join("\\n");

        out.push_str(&format!(
            "{}{} \"{}\" as {} {}\n",
            pad,
            element(node.kind),
            label,
            node.id,
            style.fill
        ));
    }
}

fn element(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Resource => "rectangle",
        NodeKind::DataSource => "database",
        NodeKind::Output => "card",
        NodeKind::Variable => "hexagon",
        NodeKind::Local => "storage",
    }
}

/// Escape a label for a PlantUML quoted string. PlantUML has no escape for
/// a literal double quote, so quotes are downgraded to single quotes.
fn escape(text: &str) -> String {
    text.replace('"', "'").replace('\n', "\\n")
}
