//! Integration tests for the tfgraph CLI
//!
//! These tests run the built binary end-to-end against plan JSON fixtures.

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Get the path to the tfgraph binary
fn tfgraph_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test executable name
    path.pop(); // Remove deps directory

    path.push("tfgraph");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

/// Run tfgraph and return its output
fn run_tfgraph(args: &[&str]) -> std::process::Output {
    Command::new(tfgraph_binary())
        .args(args)
        .output()
        .expect("Failed to execute tfgraph")
}

/// Write a plan fixture to a temp file
fn plan_fixture(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create fixture");
    file.write_all(json.as_bytes()).expect("Failed to write fixture");
    file
}

/// Scenario: three resources, two explicit dependencies, two module groups
const SCENARIO_PLAN: &str = r#"{
  "format_version": "1.2",
  "terraform_version": "1.7.0",
  "resource_changes": [
    {
      "address": "aws_security_group.web",
      "mode": "managed", "type": "aws_security_group", "name": "web",
      "change": {"actions": ["create"]}
    },
    {
      "address": "aws_instance.web",
      "mode": "managed", "type": "aws_instance", "name": "web",
      "change": {"actions": ["create"]}
    },
    {
      "address": "module.database.aws_instance.db",
      "module_address": "module.database",
      "mode": "managed", "type": "aws_instance", "name": "db",
      "change": {"actions": ["create"]}
    }
  ],
  "configuration": {
    "root_module": {
      "resources": [
        {
          "address": "aws_security_group.web",
          "mode": "managed", "type": "aws_security_group", "name": "web",
          "expressions": {}
        },
        {
          "address": "aws_instance.web",
          "mode": "managed", "type": "aws_instance", "name": "web",
          "expressions": {},
          "depends_on": ["aws_security_group.web"]
        }
      ],
      "module_calls": {
        "database": {
          "expressions": {},
          "module": {
            "resources": [
              {
                "address": "aws_instance.db",
                "mode": "managed", "type": "aws_instance", "name": "db",
                "expressions": {},
                "depends_on": ["aws_instance.web"]
              }
            ]
          }
        }
      }
    }
  }
}"#;

#[test]
fn test_version() {
    let output = run_tfgraph(&["--version"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tfgraph"));
}

#[test]
fn test_help() {
    let output = run_tfgraph(&["--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("graph"));
    assert!(stdout.contains("summary"));
}

#[test]
fn test_graph_help_documents_format_alias() {
    let output = run_tfgraph(&["graph", "--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alias for graphviz"));
}

#[test]
fn test_dot_format_alias() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let output = run_tfgraph(&[
        "graph",
        fixture.path().to_str().unwrap(),
        "--format",
        "dot",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph"));
}

#[test]
fn test_graph_scenario_graphviz() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let output = run_tfgraph(&["graph", fixture.path().to_str().unwrap()]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph"));

    // 3 nodes with labels
    assert!(stdout.contains("aws_security_group.web"));
    assert!(stdout.contains("aws_instance.web"));
    assert!(stdout.contains("module.database.aws_instance.db"));

    // 2 edges
    assert_eq!(stdout.matches(" -> ").count(), 2);

    // 2 module clusters: root and module.database
    assert_eq!(stdout.matches("subgraph cluster_").count(), 2);
    assert!(stdout.contains("label = \"root\";"));
    assert!(stdout.contains("label = \"module.database\";"));
}

#[test]
fn test_graph_mermaid_and_plantuml() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let path = fixture.path().to_str().unwrap().to_string();

    let output = run_tfgraph(&["graph", &path, "--format", "mermaid"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("flowchart LR"));
    assert!(stdout.contains("subgraph "));
    assert!(stdout.contains("classDef create"));

    let output = run_tfgraph(&["graph", &path, "--format", "plantuml"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("@startuml"));
    assert!(stdout.contains("package \"module.database\""));
}

#[test]
fn test_graph_output_is_deterministic() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let path = fixture.path().to_str().unwrap().to_string();

    let first = run_tfgraph(&["graph", &path]);
    let second = run_tfgraph(&["graph", &path]);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_exclusion_flags_noop_on_resource_only_plan() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let path = fixture.path().to_str().unwrap().to_string();

    let default_run = run_tfgraph(&["graph", &path]);
    let filtered_run = run_tfgraph(&[
        "graph",
        &path,
        "--no-data-sources",
        "--no-outputs",
        "--no-variables",
        "--no-locals",
    ]);

    assert!(default_run.status.success());
    assert!(filtered_run.status.success());
    assert_eq!(default_run.stdout, filtered_run.stdout);
}

#[test]
fn test_unknown_format_fails_before_reading_input() {
    // The plan path does not exist; a format error must come first.
    let output = run_tfgraph(&["graph", "/nonexistent/plan.json", "--format", "svg"]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported format 'svg'"));
    assert!(!stderr.contains("Failed to read plan file"));
}

#[test]
fn test_unknown_group_by_rejected() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let output = run_tfgraph(&[
        "graph",
        fixture.path().to_str().unwrap(),
        "--group-by",
        "provider",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported group-by 'provider'"));
}

#[test]
fn test_graph_writes_output_file() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let out_file = NamedTempFile::new().unwrap();
    let out_path = out_file.path().to_str().unwrap().to_string();

    let output = run_tfgraph(&[
        "graph",
        fixture.path().to_str().unwrap(),
        "--output",
        &out_path,
    ]);

    assert!(output.status.success());
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.starts_with("digraph"));

    // Nothing but status messages on stdout when writing to a file
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("digraph"));
}

#[test]
fn test_unsupported_schema_version_fails() {
    let fixture = plan_fixture(r#"{"format_version": "2.0", "resource_changes": []}"#);
    let output = run_tfgraph(&["graph", fixture.path().to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported plan format version"));
}

#[test]
fn test_malformed_plan_fails() {
    let fixture = plan_fixture("{not json");
    let output = run_tfgraph(&["graph", fixture.path().to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse plan document"));
}

#[test]
fn test_summary_reports_changes() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let output = run_tfgraph(&["summary", fixture.path().to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Plan Summary"));
    assert!(stdout.contains("create"));
    assert!(stdout.contains("aws_instance.web"));
}

#[test]
fn test_group_by_action() {
    let fixture = plan_fixture(SCENARIO_PLAN);
    let output = run_tfgraph(&[
        "graph",
        fixture.path().to_str().unwrap(),
        "--group-by",
        "action",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("subgraph cluster_").count(), 1);
    assert!(stdout.contains("label = \"create\";"));
}
