//! Abstract graph produced by the builder and consumed by renderers

use crate::plan::ChangeAction;

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    Resource,
    DataSource,
    Output,
    Variable,
    Local,
}

/// A single node of the abstract graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Grammar-safe identifier, derived deterministically from the address
    pub id: String,

    /// Source address this node was derived from
    pub address: String,

    /// Primary display label
    pub label: String,

    /// Secondary detail line; renderers omit it in compact mode
    pub detail: Option<String>,

    pub kind: NodeKind,
    pub action: ChangeAction,

    /// Group key assigned by the active grouping policy
    pub group: String,

    /// Whether any attribute of the underlying entity is sensitive
    pub sensitive: bool,
}

/// Kind of relationship an edge represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeKind {
    /// Resource-to-resource dependency
    Dependency,
    /// Value flow involving an output, variable or local
    DataFlow,
}

/// A directed edge from a consumer node to the node it depends on
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    /// Source node id (the consumer)
    pub source: String,
    /// Target node id (the dependency)
    pub target: String,
    pub kind: EdgeKind,
}

/// The complete abstract graph: sorted nodes, sorted edges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Distinct group keys in node order (already sorted by the builder)
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.nodes.iter().map(|n| n.group.as_str()).collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Nodes assigned to the given group key, in node order
    pub fn nodes_in_group<'a>(&'a self, group: &str) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |n| n.group == group)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(address: &str, group: &str) -> Node {
        Node {
            id: address.replace('.', "_"),
            address: address.to_string(),
            label: address.to_string(),
            detail: None,
            kind: NodeKind::Resource,
            action: ChangeAction::Create,
            group: group.to_string(),
            sensitive: false,
        }
    }

    #[test]
    fn test_groups_are_distinct_and_sorted() {
        let graph = Graph {
            nodes: vec![
                node("b.b", "module.db"),
                node("a.a", ""),
                node("c.c", "module.db"),
            ],
            edges: Vec::new(),
        };
        assert_eq!(graph.groups(), vec!["", "module.db"]);
        assert_eq!(graph.nodes_in_group("module.db").count(), 2);
    }
}
