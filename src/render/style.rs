//! Shared styling and identifier handling for all renderers
//!
//! All three grammars use the same canonical (kind, action) styling and the
//! same identifier sanitization, so a graph keeps identical semantics no
//! matter which format renders it.

use crate::graph::{GroupBy, Node};
use crate::plan::ChangeAction;

/// A visual class shared across grammars: a stable name plus fill color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleClass {
    pub name: &'static str,
    pub fill: &'static str,
    pub stroke: &'static str,
}

/// Canonical action styling: create green, update yellow, delete red,
/// replace orange, no-op grey
pub fn style_class(action: ChangeAction) -> StyleClass {
    match action {
        ChangeAction::Create => StyleClass {
            name: "create",
            // Pastel mint green
            fill: "#98e198",
            stroke: "#2f7d2f",
        },
        ChangeAction::Update => StyleClass {
            name: "update",
            // Pastel cream/yellow
            fill: "#ffe6a0",
            stroke: "#b08d2a",
        },
        ChangeAction::Delete => StyleClass {
            name: "delete",
            // Pastel coral
            fill: "#ffa0a0",
            stroke: "#a23b3b",
        },
        ChangeAction::Replace => StyleClass {
            name: "replace",
            // Pastel orange
            fill: "#ffc078",
            stroke: "#b06a1f",
        },
        ChangeAction::NoOp => StyleClass {
            name: "noop",
            // Grey
            fill: "#d3d3d3",
            stroke: "#7a7a7a",
        },
    }
}

/// All style classes in a stable order, for grammars that declare classes
/// up front (Mermaid classDef)
pub fn all_style_classes() -> [StyleClass; 5] {
    [
        style_class(ChangeAction::Create),
        style_class(ChangeAction::Update),
        style_class(ChangeAction::Delete),
        style_class(ChangeAction::Replace),
        style_class(ChangeAction::NoOp),
    ]
}

/// Map a source address to a grammar-safe identifier.
///
/// The encoding is injective: alphanumerics pass through, `_` escapes to
/// `__`, and every other character becomes `_<hex>_`. Distinct addresses
/// therefore can never collide, and the result depends only on the input.
pub fn sanitize_id(address: &str) -> String {
    let mut id = String::with_capacity(address.len() + 4);
    for c in address.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => id.push(c),
            '_' => id.push_str("__"),
            other => {
                id.push('_');
                id.push_str(&format!("{:x}", other as u32));
                id.push('_');
            }
        }
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert_str(0, "n_");
    }
    id
}

/// The display lines for a node: address, optional detail, sensitivity
/// marker. Renderers join them with their grammar's line separator.
pub fn label_lines(node: &Node, compact: bool) -> Vec<String> {
    let mut lines = vec![node.label.clone()];
    if !compact && let Some(detail) = &node.detail {
        lines.push(detail.clone());
    }
    if node.sensitive {
        lines.push("(sensitive)".to_string());
    }
    lines
}

/// Display label for a group key
pub fn group_label(key: &str, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Module if key.is_empty() => "root".to_string(),
        _ => key.to_string(),
    }
}

/// One grouping construct, possibly containing nested constructs
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub key: String,
    pub label: String,
    pub children: Vec<GroupNode>,
}

/// Arrange group keys into the hierarchy renderers draw.
///
/// Under module grouping, `module.app.module.db` nests inside `module.app`
/// (attaching to the nearest present ancestor when intermediate modules
/// hold no nodes of their own). Other grouping policies are flat.
pub fn group_tree(keys: &[&str], group_by: GroupBy) -> Vec<GroupNode> {
    let mut roots: Vec<GroupNode> = Vec::new();

    // Sorted keys put every ancestor before its descendants.
    let mut sorted: Vec<&str> = keys.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    for key in sorted {
        let node = GroupNode {
            key: key.to_string(),
            label: group_label(key, group_by),
            children: Vec::new(),
        };

        if group_by == GroupBy::Module
            && let Some(parent) = find_ancestor_mut(&mut roots, key)
        {
            parent.children.push(node);
        } else {
            roots.push(node);
        }
    }

    roots
}

fn find_ancestor_mut<'a>(roots: &'a mut Vec<GroupNode>, key: &str) -> Option<&'a mut GroupNode> {
    let mut ancestor = key;
    let mut nearest = None;
    while let Some(idx) = ancestor.rfind(".module.") {
        ancestor = &key[..idx];
        if group_exists(roots, ancestor) {
            nearest = Some(ancestor);
            break;
        }
    }
    find_group_mut(roots, nearest?)
}

fn group_exists(nodes: &[GroupNode], key: &str) -> bool {
    nodes
        .iter()
        .any(|node| node.key == key || group_exists(&node.children, key))
}

fn find_group_mut<'a>(nodes: &'a mut Vec<GroupNode>, key: &str) -> Option<&'a mut GroupNode> {
    for node in nodes {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find_group_mut(&mut node.children, key) {
            return Some(found);
        }
    }
    None
}
