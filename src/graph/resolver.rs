//! Dependency resolution for plan resources
//!
//! For a given resource the resolver returns the set of node addresses it
//! depends on: the union of its explicitly declared dependency list and
//! every address referenced inside its attribute expression subtree.
//! Self-references are discarded and references to addresses not present
//! in the plan are silently dropped.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GraphError;
use crate::plan::{ConfigModule, Plan, ResourceChange, join_address, strip_index};

/// Maximum reference-chain length followed through module-call arguments
const MAX_REFERENCE_DEPTH: usize = 128;

/// Result of resolving one entity's dependencies
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved node addresses (full instance addresses, de-duplicated)
    pub deps: BTreeSet<String>,
    /// Reference tokens that matched nothing in the plan
    pub dropped: Vec<String>,
}

/// Resolves explicit and implicit dependencies against the known node set
pub struct DependencyResolver {
    /// Index-stripped base address -> full node addresses (instances)
    instances: BTreeMap<String, Vec<String>>,
    /// Base resource address -> reference tokens from its expressions
    resource_refs: BTreeMap<String, Vec<String>>,
    /// Output node address -> reference tokens from its expression
    output_refs: BTreeMap<String, Vec<String>>,
    /// Module address -> call name -> argument name -> reference tokens
    call_args: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>,
}

impl DependencyResolver {
    /// Build a resolver from the plan's configuration tree and the set of
    /// node addresses the builder is considering
    pub fn new(plan: &Plan, node_addresses: impl IntoIterator<Item = String>) -> Self {
        let mut resolver = DependencyResolver {
            instances: BTreeMap::new(),
            resource_refs: BTreeMap::new(),
            output_refs: BTreeMap::new(),
            call_args: BTreeMap::new(),
        };

        for address in node_addresses {
            let base = strip_index(&address).into_owned();
            resolver.instances.entry(base).or_default().push(address);
        }

        resolver.index_module(&plan.root_module, "");
        resolver
    }

    fn index_module(&mut self, module: &ConfigModule, module_address: &str) {
        for resource in &module.resources {
            let base = join_address(module_address, &strip_index(&resource.address));
            let tokens = resource
                .expressions
                .values()
                .flat_map(|expr| expr.references())
                .map(str::to_string)
                .collect();
            self.resource_refs.insert(base, tokens);
        }

        for (name, output) in &module.outputs {
            let address = join_address(module_address, &format!("output.{}", name));
            let tokens = output
                .expression
                .references()
                .into_iter()
                .map(str::to_string)
                .collect();
            self.output_refs.insert(address, tokens);
        }

        for (name, call) in &module.module_calls {
            let mut args = BTreeMap::new();
            for (arg, expr) in &call.expressions {
                let tokens = expr.references().into_iter().map(str::to_string).collect();
                args.insert(arg.clone(), tokens);
            }
            self.call_args
                .entry(module_address.to_string())
                .or_default()
                .insert(name.clone(), args);

            let child_address = join_address(module_address, &format!("module.{}", name));
            self.index_module(&call.module, &child_address);
        }
    }

    /// Resolve the full dependency set of one resource change record:
    /// explicit depends_on entries plus implicit expression references
    pub fn resource_dependencies(&self, rc: &ResourceChange) -> Result<Resolution, GraphError> {
        let self_base = strip_index(&rc.address).into_owned();
        let mut bases = BTreeSet::new();
        let mut resolution = Resolution::default();
        let mut visited = BTreeSet::new();

        for dep in &rc.depends_on {
            self.resolve_token(
                dep,
                &rc.module_address,
                MAX_REFERENCE_DEPTH,
                &mut visited,
                &mut bases,
                &mut resolution.dropped,
            )?;
        }

        if let Some(tokens) = self.resource_refs.get(&self_base) {
            for token in tokens {
                self.resolve_token(
                    token,
                    &rc.module_address,
                    MAX_REFERENCE_DEPTH,
                    &mut visited,
                    &mut bases,
                    &mut resolution.dropped,
                )?;
            }
        }

        bases.remove(&self_base);
        resolution.deps = self.expand_instances(&bases);
        Ok(resolution)
    }

    /// Resolve the dependency set of one output node
    pub fn output_dependencies(
        &self,
        address: &str,
        module_address: &str,
    ) -> Result<Resolution, GraphError> {
        let mut bases = BTreeSet::new();
        let mut resolution = Resolution::default();
        let mut visited = BTreeSet::new();

        if let Some(tokens) = self.output_refs.get(address) {
            for token in tokens {
                self.resolve_token(
                    token,
                    module_address,
                    MAX_REFERENCE_DEPTH,
                    &mut visited,
                    &mut bases,
                    &mut resolution.dropped,
                )?;
            }
        }

        bases.remove(address);
        resolution.deps = self.expand_instances(&bases);
        Ok(resolution)
    }

    /// Resolve one reference token within a module scope.
    ///
    /// Resource and data-source tokens are matched by longest dotted prefix
    /// against the known node set, climbing from the referencing module
    /// through its ancestors. `var.*` tokens additionally follow the
    /// module-call argument in the parent scope, so a resource reached
    /// through a module call gains an edge to the outer referenced entity.
    fn resolve_token(
        &self,
        token: &str,
        module_address: &str,
        depth: usize,
        visited: &mut BTreeSet<(String, String)>,
        out: &mut BTreeSet<String>,
        dropped: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        if depth == 0 {
            return Err(GraphError::ResourceLimit(format!(
                "reference chain exceeds {} hops",
                MAX_REFERENCE_DEPTH
            )));
        }

        // Scopes of count/for_each-expanded modules carry instance indexes
        // ("module.app[0]"); declarations are keyed by the index-free
        // address, so the scope is normalized before any lookup.
        let module_address = strip_index(module_address);
        let module_address = module_address.as_ref();

        if !visited.insert((module_address.to_string(), token.to_string())) {
            return Ok(());
        }

        let token = strip_index(token).into_owned();
        let segments: Vec<&str> = token.split('.').collect();

        if let Some(rest) = token.strip_prefix("var.") {
            let name = rest.split('.').next().unwrap_or(rest);
            let address = join_address(module_address, &format!("var.{}", name));
            let known = self.instances.contains_key(&address);
            if known {
                out.insert(address);
            }

            // Follow the module-call argument for this variable in the
            // parent scope; module boundaries do not suppress discovery.
            let mut followed = false;
            if let Some((parent, call)) = split_parent_call(module_address)
                && let Some(tokens) = self
                    .call_args
                    .get(parent)
                    .and_then(|calls| calls.get(call))
                    .and_then(|args| args.get(name))
            {
                for parent_token in tokens {
                    followed = true;
                    self.resolve_token(parent_token, parent, depth - 1, visited, out, dropped)?;
                }
            }

            if !known && !followed {
                dropped.push(token.to_string());
            }
            return Ok(());
        }

        if let Some(rest) = token.strip_prefix("local.") {
            let name = rest.split('.').next().unwrap_or(rest);
            let address = join_address(module_address, &format!("local.{}", name));
            if self.instances.contains_key(&address) {
                out.insert(address);
            } else {
                dropped.push(token.to_string());
            }
            return Ok(());
        }

        // Resource and data-source references: longest known dotted prefix,
        // nearest enclosing scope first.
        for scope in scope_chain(module_address) {
            let candidate = join_address(&scope, &token);
            if let Some(base) = self.longest_known_prefix(&candidate) {
                out.insert(base);
                return Ok(());
            }
        }

        // A `module.<call>.<name>` token that matched no resource refers to
        // the called module's output.
        if segments.len() >= 3 && segments[0] == "module" {
            let child = join_address(module_address, &format!("module.{}", segments[1]));
            let address = join_address(&child, &format!("output.{}", segments[2]));
            if self.instances.contains_key(&address) {
                out.insert(address);
                return Ok(());
            }
        }

        dropped.push(token.to_string());
        Ok(())
    }

    fn longest_known_prefix(&self, address: &str) -> Option<String> {
        let mut parts: Vec<&str> = address.split('.').collect();
        while parts.len() >= 2 {
            let candidate = parts.join(".");
            if self.instances.contains_key(&candidate) {
                return Some(candidate);
            }
            parts.pop();
        }
        None
    }

    fn expand_instances(&self, bases: &BTreeSet<String>) -> BTreeSet<String> {
        bases
            .iter()
            .flat_map(|base| {
                self.instances
                    .get(base)
                    .into_iter()
                    .flatten()
                    .cloned()
            })
            .collect()
    }
}

/// Enclosing module scopes from nearest to root; e.g.
/// "module.a.module.b" -> ["module.a.module.b", "module.a", ""]
fn scope_chain(module_address: &str) -> Vec<String> {
    let mut scopes = Vec::new();
    let mut current = module_address;
    loop {
        scopes.push(current.to_string());
        if current.is_empty() {
            return scopes;
        }
        current = match current.rfind(".module.") {
            Some(idx) => &current[..idx],
            None => "",
        };
    }
}

/// Split a module address into its parent scope and final call name
fn split_parent_call(module_address: &str) -> Option<(&str, &str)> {
    if module_address.is_empty() {
        return None;
    }
    match module_address.rfind(".module.") {
        Some(idx) => Some((&module_address[..idx], &module_address[idx + ".module.".len()..])),
        None => module_address.strip_prefix("module.").map(|call| ("", call)),
    }
}
