//! Graph construction from a parsed plan
//!
//! The builder selects nodes according to the exclusion flags, classifies
//! actions, assigns group keys, materializes edges through the dependency
//! resolver, and sorts everything so the rendered output is reproducible
//! across runs.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GraphError;
use crate::output;
use crate::plan::{ChangeAction, ConfigModule, Plan, join_address};
use crate::render::sanitize_id;

use super::options::{GraphOptions, GroupBy};
use super::resolver::DependencyResolver;
use super::types::{Edge, EdgeKind, Graph, Node, NodeKind};

/// Builds the abstract graph for a plan under a set of options
pub struct GraphBuilder<'a> {
    plan: &'a Plan,
    options: &'a GraphOptions,
}

/// A node candidate before exclusion filtering
struct Candidate {
    address: String,
    module_address: String,
    label: String,
    detail: Option<String>,
    kind: NodeKind,
    action: ChangeAction,
    sensitive: bool,
    resource_type: Option<String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(plan: &'a Plan, options: &'a GraphOptions) -> Self {
        Self { plan, options }
    }

    /// Derive the abstract graph: nodes, edges and group assignments
    pub fn build(&self) -> Result<Graph, GraphError> {
        let candidates = self.collect_candidates();

        let resolver = DependencyResolver::new(
            self.plan,
            candidates.iter().map(|c| c.address.clone()),
        );

        let mut nodes = Vec::new();
        let mut ids: BTreeMap<String, String> = BTreeMap::new();

        for candidate in &candidates {
            if self.is_excluded(candidate.kind) {
                continue;
            }

            let id = sanitize_id(&candidate.address);
            if let Some(existing) = ids.insert(id.clone(), candidate.address.clone())
                && existing != candidate.address
            {
                return Err(GraphError::Consistency(format!(
                    "sanitized id '{}' collides for addresses '{}' and '{}'",
                    id, existing, candidate.address
                )));
            }

            nodes.push(Node {
                id,
                address: candidate.address.clone(),
                label: candidate.label.clone(),
                detail: candidate.detail.clone(),
                kind: candidate.kind,
                action: candidate.action,
                group: self.group_key(candidate),
                sensitive: candidate.sensitive,
            });
        }

        let included: BTreeSet<&str> = nodes.iter().map(|n| n.address.as_str()).collect();
        let id_of: BTreeMap<&str, &str> = nodes
            .iter()
            .map(|n| (n.address.as_str(), n.id.as_str()))
            .collect();

        let mut edges = BTreeSet::new();

        for rc in &self.plan.resource_changes {
            if !included.contains(rc.address.as_str()) {
                continue;
            }

            let resolution = resolver.resource_dependencies(rc)?;
            self.log_dropped(&rc.address, &resolution.dropped);

            for dep in &resolution.deps {
                // Edges to excluded nodes are dropped, not redirected.
                if !included.contains(dep.as_str()) {
                    continue;
                }
                edges.insert(self.edge(&id_of, &rc.address, dep)?);
            }
        }

        for node in &nodes {
            if node.kind != NodeKind::Output {
                continue;
            }

            let module_address = output_module_address(&node.address);
            let resolution = resolver.output_dependencies(&node.address, module_address)?;
            self.log_dropped(&node.address, &resolution.dropped);

            for dep in &resolution.deps {
                if !included.contains(dep.as_str()) || *dep == node.address {
                    continue;
                }
                edges.insert(self.edge(&id_of, &node.address, dep)?);
            }
        }

        nodes.sort_by(|a, b| {
            (&a.address, &a.group, a.kind).cmp(&(&b.address, &b.group, b.kind))
        });
        let edges: Vec<Edge> = edges.into_iter().collect();

        if self.options.verbose {
            let groups: BTreeSet<&str> = nodes.iter().map(|n| n.group.as_str()).collect();
            output::debug(&format!(
                "Built graph: {} nodes, {} edges, {} groups",
                nodes.len(),
                edges.len(),
                groups.len()
            ));
        }

        Ok(Graph { nodes, edges })
    }

    /// Gather every potential node before exclusion filtering, so the
    /// resolver knows the full set of addressable entities
    fn collect_candidates(&self) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for rc in &self.plan.resource_changes {
            let kind = if rc.is_data_source() {
                NodeKind::DataSource
            } else {
                NodeKind::Resource
            };
            let action = rc.change.action();

            candidates.push(Candidate {
                address: rc.address.clone(),
                module_address: rc.module_address.clone(),
                label: rc.address.clone(),
                detail: change_detail(action, rc.change.changed_attributes()),
                kind,
                action,
                sensitive: rc.change.is_sensitive(),
                resource_type: Some(rc.resource_type.clone()),
            });
        }

        // Root output changes carry their own action sequence; outputs
        // declared only in the configuration default to no-op.
        let mut seen_outputs = BTreeSet::new();
        for (name, oc) in &self.plan.output_changes {
            let address = format!("output.{}", name);
            seen_outputs.insert(address.clone());
            candidates.push(Candidate {
                address,
                module_address: String::new(),
                label: format!("output.{}", name),
                detail: None,
                kind: NodeKind::Output,
                action: oc.action(),
                sensitive: oc.is_sensitive(),
                resource_type: None,
            });
        }

        self.collect_config_candidates(
            &self.plan.root_module,
            "",
            &seen_outputs,
            &mut candidates,
        );

        candidates
    }

    fn collect_config_candidates(
        &self,
        module: &ConfigModule,
        module_address: &str,
        seen_outputs: &BTreeSet<String>,
        candidates: &mut Vec<Candidate>,
    ) {
        for (name, output) in &module.outputs {
            let address = join_address(module_address, &format!("output.{}", name));
            if seen_outputs.contains(&address) {
                continue;
            }
            candidates.push(Candidate {
                address: address.clone(),
                module_address: module_address.to_string(),
                label: address,
                detail: None,
                kind: NodeKind::Output,
                action: ChangeAction::NoOp,
                sensitive: output.sensitive,
                resource_type: None,
            });
        }

        for name in &module.variables {
            let address = join_address(module_address, &format!("var.{}", name));
            candidates.push(Candidate {
                address: address.clone(),
                module_address: module_address.to_string(),
                label: address,
                detail: None,
                kind: NodeKind::Variable,
                action: ChangeAction::NoOp,
                sensitive: false,
                resource_type: None,
            });
        }

        for name in &module.locals {
            let address = join_address(module_address, &format!("local.{}", name));
            candidates.push(Candidate {
                address: address.clone(),
                module_address: module_address.to_string(),
                label: address,
                detail: None,
                kind: NodeKind::Local,
                action: ChangeAction::NoOp,
                sensitive: false,
                resource_type: None,
            });
        }

        for (name, call) in &module.module_calls {
            let child_address = join_address(module_address, &format!("module.{}", name));
            self.collect_config_candidates(&call.module, &child_address, seen_outputs, candidates);
        }
    }

    fn is_excluded(&self, kind: NodeKind) -> bool {
        match kind {
            NodeKind::Resource => false,
            NodeKind::DataSource => self.options.no_data_sources,
            NodeKind::Output => self.options.no_outputs,
            NodeKind::Variable => self.options.no_variables,
            NodeKind::Local => self.options.no_locals,
        }
    }

    fn group_key(&self, candidate: &Candidate) -> String {
        match self.options.group_by {
            GroupBy::Module => candidate.module_address.clone(),
            GroupBy::Action => candidate.action.label().to_string(),
            GroupBy::ResourceType => match (&candidate.resource_type, candidate.kind) {
                (Some(resource_type), _) => resource_type.clone(),
                (None, NodeKind::Output) => "output".to_string(),
                (None, NodeKind::Variable) => "variable".to_string(),
                (None, NodeKind::Local) => "local".to_string(),
                (None, _) => "resource".to_string(),
            },
        }
    }

    fn edge(
        &self,
        id_of: &BTreeMap<&str, &str>,
        source: &str,
        target: &str,
    ) -> Result<Edge, GraphError> {
        let lookup = |address: &str| {
            id_of.get(address).copied().map(str::to_string).ok_or_else(|| {
                GraphError::Consistency(format!("edge endpoint '{}' has no node", address))
            })
        };

        let kind = if is_value_address(source) || is_value_address(target) {
            EdgeKind::DataFlow
        } else {
            EdgeKind::Dependency
        };

        Ok(Edge {
            source: lookup(source)?,
            target: lookup(target)?,
            kind,
        })
    }

    fn log_dropped(&self, address: &str, dropped: &[String]) {
        if self.options.verbose {
            for token in dropped {
                output::debug(&format!(
                    "Skipping unresolvable reference '{}' on {}",
                    token, address
                ));
            }
        }
    }
}

/// Whether a node address names an output, variable or local value.
/// Their addresses always end in `<output|var|local>.<name>`.
fn is_value_address(address: &str) -> bool {
    let segments: Vec<&str> = address.split('.').collect();
    if segments.len() < 2 {
        return false;
    }
    matches!(segments[segments.len() - 2], "output" | "var" | "local")
}

/// Secondary node detail: a symbol-prefixed attribute count
fn change_detail(action: ChangeAction, attributes: usize) -> Option<String> {
    if attributes == 0 {
        return None;
    }
    match action {
        ChangeAction::NoOp => None,
        other => Some(format!("{}{} attributes", other.symbol(), attributes)),
    }
}

/// The module part of an output node address
fn output_module_address(address: &str) -> &str {
    match address.rfind(".output.") {
        Some(idx) => &address[..idx],
        None => "",
    }
}
