//! Mermaid flowchart renderer
//!
//! Emits a `flowchart LR` document with one subgraph per group key and a
//! classDef per action style.

use crate::error::GraphError;
use crate::graph::{EdgeKind, Graph, GraphOptions, Node, NodeKind};

use super::style::{GroupNode, all_style_classes, group_tree, label_lines, sanitize_id, style_class};
use super::Renderer;

pub struct MermaidRenderer;

impl Renderer for MermaidRenderer {
    fn generate(&self, graph: &Graph, options: &GraphOptions) -> Result<String, GraphError> {
        let mut out = String::new();
        out.push_str("flowchart LR\n");

        let groups = graph.groups();
        let tree = group_tree(&groups, options.group_by);
        for group in &tree {
            Self::write_subgraph(&mut out, graph, options, group, 1);
        }

        if !graph.edges.is_empty() {
            out.push('\n');
        }
        for edge in &graph.edges {
            match edge.kind {
                EdgeKind::Dependency => {
                    out.push_str(&format!("  {} --> {}\n", edge.source, edge.target));
                }
                EdgeKind::DataFlow => {
                    out.push_str(&format!("  {} -.-> {}\n", edge.source, edge.target));
                }
            }
        }

        out.push('\n');
        for class in all_style_classes() {
            out.push_str(&format!(
                "  classDef {} fill:{},stroke:{},color:#1a1a1a\n",
                class.name, class.fill, class.stroke
            ));
        }

        Ok(out)
    }
}

impl MermaidRenderer {
    fn write_subgraph(
        out: &mut String,
        graph: &Graph,
        options: &GraphOptions,
        group: &GroupNode,
        depth: usize,
    ) {
        let pad = "  ".repeat(depth);
        let subgraph_key = if group.key.is_empty() { "root" } else { &group.key };

        out.push_str(&format!(
            "{}subgraph g_{}[\"{}\"]\n",
            pad,
            sanitize_id(subgraph_key),
            escape(&group.label)
        ));

        for node in graph.nodes_in_group(&group.key) {
            Self::write_node(out, node, options, depth + 1);
        }

        for child in &group.children {
            Self::write_subgraph(out, graph, options, child, depth + 1);
        }

        out.push_str(&format!("{}end\n", pad));
    }

    fn write_node(out: &mut String, node: &Node, options: &GraphOptions, depth: usize) {
        let pad = "  ".repeat(depth);
        let style = style_class(node.action);
        let label = label_lines(node, options.compact)
            .iter()
            .map(|line| escape(line))
            .collect::<Vec<_>>()
            .join("<br/>");

        let (open, close) = shape(node.kind);
        out.push_str(&format!(
            "{}{}{}\"{}\"{}:::{}\n",
            pad, node.id, open, label, close, style.name
        ));
    }
}

/// Opening and closing shape brackets per node kind
fn shape(kind: NodeKind) -> (&'static str, &'static str) {
    match kind {
        NodeKind::Resource => ("[", "]"),
        NodeKind::DataSource => ("[(", ")]"),
        NodeKind::Output => ("([", "])"),
        NodeKind::Variable => ("{{", "}}"),
        NodeKind::Local => ("(", ")"),
    }
}

/// Escape HTML-sensitive characters and quotes for a quoted Mermaid label
fn escape(text: &str) -> String {
    text.replace('&', "#amp;")
        .replace('"', "#quot;")
        .replace('<', "#lt;")
        .replace('>', "#gt;")
        .replace('\n', "<br/>")
}
