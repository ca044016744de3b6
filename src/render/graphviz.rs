//! Graphviz DOT renderer
//!
//! Emits a `digraph` with one cluster per group key; nested module
//! addresses become nested clusters.

use crate::error::GraphError;
use crate::graph::{EdgeKind, Graph, GraphOptions, Node, NodeKind};

use super::style::{GroupNode, group_tree, label_lines, sanitize_id, style_class};
use super::Renderer;

pub struct GraphvizRenderer;

impl Renderer for GraphvizRenderer {
    fn generate(&self, graph: &Graph, options: &GraphOptions) -> Result<String, GraphError> {
        let mut out = String::new();
        out.push_str("digraph tfgraph {\n");
        out.push_str("  rankdir = \"LR\";\n");
        out.push_str("  compound = \"true\";\n");
        out.push_str("  node [fontname = \"Helvetica\", style = \"filled\"];\n");

        let groups = graph.groups();
        let tree = group_tree(&groups, options.group_by);
        for group in &tree {
            Self::write_cluster(&mut out, graph, options, group, 1);
        }

        if !graph.edges.is_empty() {
            out.push('\n');
        }
        for edge in &graph.edges {
            match edge.kind {
                EdgeKind::Dependency => {
                    out.push_str(&format!("  {} -> {};\n", edge.source, edge.target));
                }
                EdgeKind::DataFlow => {
                    out.push_str(&format!(
                        "  {} -> {} [style = \"dashed\"];\n",
                        edge.source, edge.target
                    ));
                }
            }
        }

        out.push_str("}\n");
        Ok(out)
    }
}

impl GraphvizRenderer {
    fn write_cluster(
        out: &mut String,
        graph: &Graph,
        options: &GraphOptions,
        group: &GroupNode,
        depth: usize,
    ) {
        let pad = "  ".repeat(depth);
        let cluster_key = if group.key.is_empty() { "root" } else { &group.key };

        out.push_str(&format!(
            "\n{}subgraph cluster_{} {{\n",
            pad,
            sanitize_id(cluster_key)
        ));
        out.push_str(&format!("{}  label = \"{}\";\n", pad, escape(&group.label)));
        out.push_str(&format!("{}  style = \"rounded\";\n", pad));

        for node in graph.nodes_in_group(&group.key) {
            Self::write_node(out, node, options, depth + 1);
        }

        for child in &group.children {
            Self::write_cluster(out, graph, options, child, depth + 1);
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
            "{}{} [label = \"{}\", shape = {}, fillcolor = \"{}\", color = \"{}\"];\n",
            pad,
            node.id,
            label,
            shape(node.kind),
            style.fill,
            style.stroke
        ));
    }
}

fn shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Resource => "box",
        NodeKind::DataSource => "cylinder",
        NodeKind::Output => "note",
        NodeKind::Variable => "ellipse",
        NodeKind::Local => "diamond",
    }
}

/// Escape a string for use inside a DOT double-quoted literal
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GroupBy;
    use crate::plan::ChangeAction;

    fn node(address: &str, group: &str, action: ChangeAction) -> Node {
        Node {
            id: sanitize_id(address),
            address: address.to_string(),
            label: address.to_string(),
            detail: None,
            kind: NodeKind::Resource,
            action,
            group: group.to_string(),
            sensitive: false,
        }
    }

    #[test]
    fn test_clusters_per_group() {
        let graph = Graph {
            nodes: vec![
                node("aws_instance.web", "", ChangeAction::Create),
                node(
                    "module.database.aws_instance.db",
                    "module.database",
                    ChangeAction::Create,
                ),
            ],
            edges: Vec::new(),
        };

        let dot = GraphvizRenderer
            .generate(&graph, &GraphOptions::default())
            .unwrap();

        assert!(dot.contains("subgraph cluster_root"));
        assert!(dot.contains("label = \"root\";"));
        assert!(dot.contains("label = \"module.database\";"));
    }

    #[test]
    fn test_nested_module_clusters() {
        let graph = Graph {
            nodes: vec![
                node("module.app.aws_instance.a", "module.app", ChangeAction::Create),
                node(
                    "module.app.module.db.aws_instance.b",
                    "module.app.module.db",
                    ChangeAction::Create,
                ),
            ],
            edges: Vec::new(),
        };

        let dot = GraphvizRenderer
            .generate(&graph, &GraphOptions::default())
            .unwrap();

        let outer = dot.find("label = \"module.app\";").unwrap();
        let inner = dot.find("label = \"module.app.module.db\";").unwrap();
        let outer_close = dot.rfind('}').unwrap();
        assert!(outer < inner && inner < outer_close);
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut tricky = node("aws_instance.web", "", ChangeAction::Create);
        tricky.label = "say \"hello\"\nworld".to_string();

        let graph = Graph {
            nodes: vec![tricky],
            edges: Vec::new(),
        };
        let dot = GraphvizRenderer
            .generate(&graph, &GraphOptions::default())
            .unwrap();

        assert!(dot.contains("say \\\"hello\\\"\\nworld"));
    }

    #[test]
    fn test_compact_omits_detail() {
        let mut with_detail = node("aws_instance.web", "", ChangeAction::Update);
        with_detail.detail = Some("~1 attributes".to_string());

        let graph = Graph {
            nodes: vec![with_detail],
            edges: Vec::new(),
        };

        let full = GraphvizRenderer
            .generate(&graph, &GraphOptions::default())
            .unwrap();
        assert!(full.contains("~1 attributes"));

        let compact_options = GraphOptions {
            compact: true,
            ..Default::default()
        };
        let compact = GraphvizRenderer.generate(&graph, &compact_options).unwrap();
        assert!(!compact.contains("~1 attributes"));
    }

    #[test]
    fn test_action_grouping_emits_flat_clusters() {
        let graph = Graph {
            nodes: vec![
                node("aws_instance.web", "create", ChangeAction::Create),
                node("aws_instance.old", "delete", ChangeAction::Delete),
            ],
            edges: Vec::new(),
        };
        let options = GraphOptions {
            group_by: GroupBy::Action,
            ..Default::default()
        };
        let dot = GraphvizRenderer.generate(&graph, &options).unwrap();

        assert!(dot.contains("label = \"create\";"));
        assert!(dot.contains("label = \"delete\";"));
    }

    #[test]
    fn test_empty_graph_is_well_formed() {
        let dot = GraphvizRenderer
            .generate(&Graph::default(), &GraphOptions::default())
            .unwrap();
        assert!(dot.starts_with("digraph"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
