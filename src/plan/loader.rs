//! Loader for Terraform/OpenTofu plan JSON documents
//!
//! Parses the output of `terraform show -json <planfile>` into the typed
//! plan model. The loader is forward-compatible within a supported major
//! format version: any minor revision of that major line is accepted.

use serde_json::Value;
use std::collections::BTreeMap;

use super::model::{
    ConfigModule, ConfigOutput, ConfigResource, Expression, ModuleCall, OutputChange, Plan,
    PlanVariable, ResourceChange, ResourceMode,
};
use crate::error::GraphError;

/// Supported major component of the plan `format_version`
pub const SUPPORTED_FORMAT_MAJOR: u64 = 1;

/// Maximum nesting depth accepted for module calls and attribute
/// expressions before aborting with a resource-limit error
const MAX_NESTING_DEPTH: usize = 64;

/// Parses plan JSON bytes into the plan model
pub struct PlanLoader;

impl PlanLoader {
    /// Parse raw plan document bytes into a [`Plan`]
    pub fn load(bytes: &[u8]) -> Result<Plan, GraphError> {
        let doc: Value = serde_json::from_slice(bytes)?;

        let format_version = match doc.get("format_version") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| {
                    GraphError::MalformedInput(format!(
                        "format_version must be a string, got {}",
                        value
                    ))
                })?
                .to_string(),
            None => return Err(GraphError::MissingField("format_version")),
        };
        Self::check_format_version(&format_version)?;

        let terraform_version = doc
            .get("terraform_version")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let resource_changes: Vec<ResourceChange> = match doc.get("resource_changes") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => Vec::new(),
        };

        let output_changes: BTreeMap<String, OutputChange> = match doc.get("output_changes") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => BTreeMap::new(),
        };

        let variables: BTreeMap<String, PlanVariable> = match doc.get("variables") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => BTreeMap::new(),
        };

        let mut root_module = match doc
            .get("configuration")
            .and_then(|c| c.get("root_module"))
        {
            Some(module) => Self::parse_module(module, MAX_NESTING_DEPTH)?,
            None => ConfigModule::default(),
        };

        // Variables may be supplied to the plan without appearing in the
        // configuration block (e.g. partial configuration dumps).
        root_module.variables.extend(variables.keys().cloned());

        let mut plan = Plan {
            format_version,
            terraform_version,
            resource_changes,
            output_changes,
            variables,
            root_module,
        };

        Self::fold_depends_on(&mut plan);

        Ok(plan)
    }

    /// Validate the major component of a "major.minor" format version
    fn check_format_version(version: &str) -> Result<(), GraphError> {
        let major = version
            .split('.')
            .next()
            .unwrap_or_default()
            .parse::<u64>()
            .map_err(|_| {
                GraphError::MalformedInput(format!("invalid format_version '{}'", version))
            })?;

        if major != SUPPORTED_FORMAT_MAJOR {
            return Err(GraphError::SchemaVersion {
                found: version.to_string(),
                supported: SUPPORTED_FORMAT_MAJOR,
            });
        }

        Ok(())
    }

    /// Parse one node of the configuration tree
    fn parse_module(value: &Value, depth: usize) -> Result<ConfigModule, GraphError> {
        if depth == 0 {
            return Err(GraphError::ResourceLimit(format!(
                "module nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        let mut module = ConfigModule::default();

        if let Some(resources) = value.get("resources").and_then(|r| r.as_array()) {
            for resource in resources {
                // Records without an address cannot be referenced; skip them
                // rather than failing the whole document.
                let Some(address) = resource.get("address").and_then(|a| a.as_str()) else {
                    continue;
                };

                let mode = match resource.get("mode").and_then(|m| m.as_str()) {
                    Some("data") => ResourceMode::Data,
                    _ => ResourceMode::Managed,
                };

                let mut expressions = BTreeMap::new();
                if let Some(exprs) = resource.get("expressions").and_then(|e| e.as_object()) {
                    for (attr, expr) in exprs {
                        expressions.insert(attr.clone(), Self::parse_expression(expr, depth)?);
                    }
                }

                // count/for_each arguments carry references too
                if let Some(expr) = resource.get("count_expression") {
                    expressions.insert("count".to_string(), Self::parse_expression(expr, depth)?);
                }
                if let Some(expr) = resource.get("for_each_expression") {
                    expressions
                        .insert("for_each".to_string(), Self::parse_expression(expr, depth)?);
                }

                let depends_on = resource
                    .get("depends_on")
                    .and_then(|d| d.as_array())
                    .map(|deps| {
                        deps.iter()
                            .filter_map(|d| d.as_str())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                module.resources.push(ConfigResource {
                    address: address.to_string(),
                    mode,
                    expressions,
                    depends_on,
                });
            }
        }

        if let Some(calls) = value.get("module_calls").and_then(|c| c.as_object()) {
            for (name, call) in calls {
                let mut expressions = BTreeMap::new();
                if let Some(exprs) = call.get("expressions").and_then(|e| e.as_object()) {
                    for (attr, expr) in exprs {
                        expressions.insert(attr.clone(), Self::parse_expression(expr, depth)?);
                    }
                }

                let child = match call.get("module") {
                    Some(child) => Self::parse_module(child, depth - 1)?,
                    None => ConfigModule::default(),
                };

                module.module_calls.insert(
                    name.clone(),
                    ModuleCall {
                        expressions,
                        module: child,
                    },
                );
            }
        }

        if let Some(variables) = value.get("variables").and_then(|v| v.as_object()) {
            module.variables.extend(variables.keys().cloned());
        }

        if let Some(outputs) = value.get("outputs").and_then(|o| o.as_object()) {
            for (name, output) in outputs {
                let sensitive = output
                    .get("sensitive")
                    .and_then(|s| s.as_bool())
                    .unwrap_or(false);
                let expression = match output.get("expression") {
                    Some(expr) => Self::parse_expression(expr, depth)?,
                    None => Expression::default(),
                };
                module
                    .outputs
                    .insert(name.clone(), ConfigOutput { sensitive, expression });
            }
        }

        Self::discover_locals(&mut module);

        Ok(module)
    }

    /// Parse one attribute expression into its tagged-variant tree
    fn parse_expression(value: &Value, depth: usize) -> Result<Expression, GraphError> {
        if depth == 0 {
            return Err(GraphError::ResourceLimit(format!(
                "expression nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        match value {
            Value::Object(map) => {
                let mut parts = Vec::new();

                if let Some(constant) = map.get("constant_value") {
                    parts.push(Expression::Literal(constant.clone()));
                }

                if let Some(refs) = map.get("references").and_then(|r| r.as_array()) {
                    let tokens: Vec<String> = refs
                        .iter()
                        .filter_map(|r| r.as_str())
                        .map(str::to_string)
                        .collect();
                    if !tokens.is_empty() {
                        parts.push(Expression::References(tokens));
                    }
                }

                // Remaining keys are nested block expressions.
                for (key, nested) in map {
                    if key == "constant_value" || key == "references" {
                        continue;
                    }
                    parts.push(Self::parse_expression(nested, depth - 1)?);
                }

                match parts.len() {
                    0 => Ok(Expression::Literal(Value::Null)),
                    1 => Ok(parts.remove(0)),
                    _ => Ok(Expression::Composite(parts)),
                }
            }
            Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(Self::parse_expression(item, depth - 1)?);
                }
                Ok(Expression::Composite(parts))
            }
            other => Ok(Expression::Literal(other.clone())),
        }
    }

    /// Record the local value names referenced within a module's own scope
    fn discover_locals(module: &mut ConfigModule) {
        let mut locals = std::mem::take(&mut module.locals);

        let mut collect = |expr: &Expression| {
            expr.visit_references(&mut |token| {
                if let Some(rest) = token.strip_prefix("local.") {
                    let name = rest.split('.').next().unwrap_or(rest);
                    if !name.is_empty() {
                        locals.insert(name.to_string());
                    }
                }
            });
        };

        for resource in &module.resources {
            for expr in resource.expressions.values() {
                collect(expr);
            }
        }
        for call in module.module_calls.values() {
            for expr in call.expressions.values() {
                collect(expr);
            }
        }
        for output in module.outputs.values() {
            collect(&output.expression);
        }

        module.locals = locals;
    }

    /// Copy each configuration resource's depends_on list onto the matching
    /// resource change record
    fn fold_depends_on(plan: &mut Plan) {
        for rc in &mut plan.resource_changes {
            let Some(module) = find_module(&plan.root_module, &rc.module_address) else {
                continue;
            };

            let local = local_address(&rc.address, &rc.module_address);
            let local = strip_index(&local);

            if let Some(config) = module.resources.iter().find(|r| r.address == local) {
                rc.depends_on = config.depends_on.clone();
            }
        }
    }
}

/// Navigate the configuration tree to the module at the given address
pub fn find_module<'a>(root: &'a ConfigModule, module_address: &str) -> Option<&'a ConfigModule> {
    let mut current = root;
    for call_name in module_call_path(module_address)? {
        current = &current.module_calls.get(&call_name)?.module;
    }
    Some(current)
}

/// Split a module address into its call names; e.g.
/// "module.app.module.db" -> ["app", "db"]. Returns None when the address
/// is not a well-formed chain of `module.<name>` segments.
pub fn module_call_path(module_address: &str) -> Option<Vec<String>> {
    if module_address.is_empty() {
        return Some(Vec::new());
    }

    let mut names = Vec::new();
    let mut segments = module_address.split('.');
    while let Some(keyword) = segments.next() {
        if keyword != "module" {
            return None;
        }
        names.push(strip_index(segments.next()?).into_owned());
    }
    Some(names)
}

/// The module-local part of an absolute address
pub fn local_address(address: &str, module_address: &str) -> String {
    if module_address.is_empty() {
        return address.to_string();
    }
    address
        .strip_prefix(module_address)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(address)
        .to_string()
}

/// Strip instance index suffixes like `[0]` or `["key"]` from an address
pub fn strip_index(address: &str) -> std::borrow::Cow<'_, str> {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref INDEX_PATTERN: Regex =
            Regex::new(r#"\[[^\]]*\]"#).expect("Invalid index pattern regex");
    }

    INDEX_PATTERN.replace_all(address, "")
}
