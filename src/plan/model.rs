//! Data types for parsed Terraform/OpenTofu plan documents
//!
//! This module defines the typed representation of a plan JSON document
//! (`terraform show -json`): resource change records, output/variable
//! changes, and the static configuration tree with its attribute
//! expressions.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A single entry in a resource change's action sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// No change planned
    NoOp,
    /// Resource will be created
    Create,
    /// Data source will be read
    Read,
    /// Resource will be updated in-place
    Update,
    /// Resource will be destroyed
    Delete,
    /// An action this tool does not model (e.g. forget)
    #[serde(other)]
    Unknown,
}

/// Derived single-word category summarizing a planned action sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Replace,
    NoOp,
}

impl ChangeAction {
    /// Classify an action sequence into a single display category.
    ///
    /// The pair {delete, create} in either order means replace; otherwise
    /// the first declared action wins, defaulting to no-op when the list
    /// is empty. `read` (data sources) classifies as no-op since data
    /// sources are already visually distinct by shape.
    pub fn classify(actions: &[Action]) -> Self {
        match actions {
            [Action::Delete, Action::Create] | [Action::Create, Action::Delete] => {
                ChangeAction::Replace
            }
            [first, ..] => match first {
                Action::Create => ChangeAction::Create,
                Action::Update => ChangeAction::Update,
                Action::Delete => ChangeAction::Delete,
                Action::Read | Action::NoOp | Action::Unknown => ChangeAction::NoOp,
            },
            [] => ChangeAction::NoOp,
        }
    }

    /// Get the lowercase label for this change category
    pub fn label(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Replace => "replace",
            ChangeAction::NoOp => "no-op",
        }
    }

    /// Get the symbol used to represent this change category
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeAction::Create => "+",
            ChangeAction::Update => "~",
            ChangeAction::Delete => "-",
            ChangeAction::Replace => "±",
            ChangeAction::NoOp => " ",
        }
    }
}

/// Whether a resource is managed or a data source read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    Managed,
    Data,
}

/// The change block of a resource change record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Attribute map before the change (null for creations)
    #[serde(default)]
    pub before: Option<Value>,

    /// Attribute map after the change (null for deletions)
    #[serde(default)]
    pub after: Option<Value>,

    /// Per-attribute sensitivity markers before the change
    #[serde(default)]
    pub before_sensitive: Option<Value>,

    /// Per-attribute sensitivity markers after the change
    #[serde(default)]
    pub after_sensitive: Option<Value>,
}

impl Change {
    /// Classify the action sequence into a display category
    pub fn action(&self) -> ChangeAction {
        ChangeAction::classify(&self.actions)
    }

    /// Whether any attribute is marked sensitive before or after the change
    pub fn is_sensitive(&self) -> bool {
        [&self.before_sensitive, &self.after_sensitive]
            .into_iter()
            .flatten()
            .any(value_has_sensitive)
    }

    /// Count of top-level attributes touched by this change
    pub fn changed_attributes(&self) -> usize {
        match (&self.before, &self.after) {
            (Some(Value::Object(before)), Some(Value::Object(after))) => {
                let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
                keys.into_iter()
                    .filter(|k| before.get(*k) != after.get(*k))
                    .count()
            }
            (None, Some(Value::Object(after))) => after.len(),
            (Some(Value::Object(before)), None) => before.len(),
            _ => 0,
        }
    }
}

/// A single planned change to one resource or data source
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceChange {
    /// Full resource address (e.g. "module.vpc.aws_subnet.main[0]")
    pub address: String,

    /// Module path; empty for the root module
    #[serde(default)]
    pub module_address: String,

    /// Managed resource or data source
    pub mode: ResourceMode,

    /// Resource type (e.g. "aws_instance")
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource name (e.g. "example")
    pub name: String,

    /// The planned change itself
    #[serde(default)]
    pub change: Change,

    /// Module-local addresses from the declared depends_on list, folded in
    /// from the configuration tree at load time
    #[serde(skip)]
    pub depends_on: Vec<String>,
}

impl ResourceChange {
    pub fn is_data_source(&self) -> bool {
        self.mode == ResourceMode::Data
    }
}

/// A planned change to a root-module output value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputChange {
    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub after: Option<Value>,

    #[serde(default)]
    pub after_sensitive: Option<Value>,
}

impl OutputChange {
    pub fn action(&self) -> ChangeAction {
        ChangeAction::classify(&self.actions)
    }

    pub fn is_sensitive(&self) -> bool {
        self.after_sensitive.as_ref().is_some_and(value_has_sensitive)
    }

    /// Resulting value; only materialized when non-sensitive
    pub fn value(&self) -> Option<&Value> {
        if self.is_sensitive() {
            None
        } else {
            self.after.as_ref()
        }
    }
}

/// An input variable supplied to the plan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanVariable {
    #[serde(default)]
    pub value: Option<Value>,
}

/// An attribute expression: a literal value, a set of reference tokens, or
/// a composite of sub-expressions (nested blocks, lists)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    References(Vec<String>),
    Composite(Vec<Expression>),
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Literal(Value::Null)
    }
}

impl Expression {
    /// Visit every reference token in this expression subtree
    pub fn visit_references<'a>(&'a self, visit: &mut impl FnMut(&'a str)) {
        match self {
            Expression::Literal(_) => {}
            Expression::References(refs) => {
                for token in refs {
                    visit(token);
                }
            }
            Expression::Composite(children) => {
                for child in children {
                    child.visit_references(visit);
                }
            }
        }
    }

    /// Collect every reference token in this expression subtree
    pub fn references(&self) -> Vec<&str> {
        let mut tokens = Vec::new();
        self.visit_references(&mut |t| tokens.push(t));
        tokens
    }
}

/// A resource declaration within the configuration tree
#[derive(Debug, Clone)]
pub struct ConfigResource {
    /// Module-local address (e.g. "aws_instance.web")
    pub address: String,
    pub mode: ResourceMode,
    pub expressions: BTreeMap<String, Expression>,
    pub depends_on: Vec<String>,
}

/// A module call: its argument expressions and the called module's tree
#[derive(Debug, Clone, Default)]
pub struct ModuleCall {
    pub expressions: BTreeMap<String, Expression>,
    pub module: ConfigModule,
}

/// An output declaration within the configuration tree
#[derive(Debug, Clone, Default)]
pub struct ConfigOutput {
    pub sensitive: bool,
    pub expression: Expression,
}

/// One node of the configuration tree, mirroring module nesting
#[derive(Debug, Clone, Default)]
pub struct ConfigModule {
    pub resources: Vec<ConfigResource>,
    pub module_calls: BTreeMap<String, ModuleCall>,
    pub variables: BTreeSet<String>,
    pub outputs: BTreeMap<String, ConfigOutput>,
    /// Local value names referenced in this module; the plan document does
    /// not declare locals, so they are discovered from `local.*` tokens
    pub locals: BTreeSet<String>,
}

/// Fully parsed plan document
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub format_version: String,
    pub terraform_version: Option<String>,
    pub resource_changes: Vec<ResourceChange>,
    pub output_changes: BTreeMap<String, OutputChange>,
    pub variables: BTreeMap<String, PlanVariable>,
    pub root_module: ConfigModule,
}

/// Join a module address and a module-local address
pub fn join_address(module_address: &str, local: &str) -> String {
    if module_address.is_empty() {
        local.to_string()
    } else {
        format!("{}.{}", module_address, local)
    }
}

fn value_has_sensitive(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Array(items) => items.iter().any(value_has_sensitive),
        Value::Object(map) => map.values().any(value_has_sensitive),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_replace_either_order() {
        assert_eq!(
            ChangeAction::classify(&[Action::Delete, Action::Create]),
            ChangeAction::Replace
        );
        assert_eq!(
            ChangeAction::classify(&[Action::Create, Action::Delete]),
            ChangeAction::Replace
        );
    }

    #[test]
    fn test_classify_first_action_wins() {
        assert_eq!(ChangeAction::classify(&[Action::Create]), ChangeAction::Create);
        assert_eq!(ChangeAction::classify(&[Action::Update]), ChangeAction::Update);
        assert_eq!(ChangeAction::classify(&[Action::Delete]), ChangeAction::Delete);
    }

    #[test]
    fn test_classify_defaults_to_noop() {
        assert_eq!(ChangeAction::classify(&[]), ChangeAction::NoOp);
        assert_eq!(ChangeAction::classify(&[Action::Read]), ChangeAction::NoOp);
        assert_eq!(ChangeAction::classify(&[Action::NoOp]), ChangeAction::NoOp);
    }

    #[test]
    fn test_change_action_symbols() {
        assert_eq!(ChangeAction::Create.symbol(), "+");
        assert_eq!(ChangeAction::Update.symbol(), "~");
        assert_eq!(ChangeAction::Delete.symbol(), "-");
        assert_eq!(ChangeAction::Replace.symbol(), "±");
    }

    #[test]
    fn test_change_sensitivity() {
        let change = Change {
            after_sensitive: Some(json!({"password": true, "name": false})),
            ..Default::default()
        };
        assert!(change.is_sensitive());

        let change = Change {
            after_sensitive: Some(json!({"name": false})),
            ..Default::default()
        };
        assert!(!change.is_sensitive());
    }

    #[test]
    fn test_changed_attributes() {
        let change = Change {
            before: Some(json!({"ami": "ami-old", "tags": {"a": 1}})),
            after: Some(json!({"ami": "ami-new", "tags": {"a": 1}})),
            ..Default::default()
        };
        assert_eq!(change.changed_attributes(), 1);

        let create = Change {
            before: None,
            after: Some(json!({"ami": "ami-new", "instance_type": "t3.micro"})),
            ..Default::default()
        };
        assert_eq!(create.changed_attributes(), 2);
    }

    #[test]
    fn test_output_value_hidden_when_sensitive() {
        let output = OutputChange {
            actions: vec![Action::Create],
            after: Some(json!("secret")),
            after_sensitive: Some(json!(true)),
        };
        assert!(output.is_sensitive());
        assert_eq!(output.value(), None);

        let output = OutputChange {
            actions: vec![Action::Create],
            after: Some(json!("10.0.0.1")),
            after_sensitive: Some(json!(false)),
        };
        assert_eq!(output.value(), Some(&json!("10.0.0.1")));
    }

    #[test]
    fn test_expression_references() {
        let expr = Expression::Composite(vec![
            Expression::Literal(json!("literal")),
            Expression::References(vec!["aws_instance.web.id".to_string()]),
            Expression::Composite(vec![Expression::References(vec![
                "var.name".to_string(),
            ])]),
        ]);
        assert_eq!(expr.references(), vec!["aws_instance.web.id", "var.name"]);
    }

    #[test]
    fn test_join_address() {
        assert_eq!(join_address("", "aws_instance.web"), "aws_instance.web");
        assert_eq!(
            join_address("module.database", "aws_instance.db"),
            "module.database.aws_instance.db"
        );
    }
}
