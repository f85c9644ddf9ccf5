//! Integration tests for top-level CLI behavior.

use std::path::{Path, PathBuf};
use std::process::Command;

fn run_archscope(root: &Path, args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_archscope");
    Command::new(bin)
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("ARCHSCOPE_RECORD")
        .output()
        .expect("failed to run archscope binary")
}

/// A throwaway project: a Python handler calling into a repository module.
fn project(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("archscope_cli_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("app/handlers")).unwrap();
    std::fs::create_dir_all(dir.join("app/db")).unwrap();
    std::fs::write(
        dir.join("app/db/orders.py"),
        "class Orders:\n    def find(self, key):\n        return key\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("app/handlers/orders_handler.py"),
        "def handle(request):\n    return find(request)\n",
    )
    .unwrap();
    std::fs::write(dir.join("README.md"), "# fixture\n").unwrap();
    dir
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn graph_prints_process_overview_as_json() {
    let dir = project("graph");
    let value = stdout_json(&run_archscope(&dir, &["graph", "--granularity", "process"]));

    assert_eq!(value["files"].as_array().unwrap().len(), 2);
    let systems: Vec<&str> = value["graph"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["kind"] == "system")
        .map(|n| n["label"].as_str().unwrap())
        .collect();
    assert_eq!(systems, vec!["Data Access", "Presentation"]);
    let edge = &value["graph"]["edges"][0];
    assert_eq!(edge["source_id"], "group:Presentation");
    assert_eq!(edge["target_id"], "group:Data Access");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn drill_walks_into_a_system() {
    let dir = project("drill");
    let value = stdout_json(&run_archscope(&dir, &["drill", "group:Data Access"]));

    assert_eq!(value["breadcrumbs"], serde_json::json!(["System", "Data Access"]));
    assert_eq!(value["steps"][0]["strategy"], "heuristic process flow");
    assert_eq!(value["graph"]["nodes"].as_array().unwrap().len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn preview_prints_the_enclosing_entity() {
    let dir = project("preview");
    let value = stdout_json(&run_archscope(&dir, &["preview", "app/db/orders.py", "2"]));

    assert_eq!(value["entity"], "find");
    assert_eq!(value["preview"]["content"], "    def find(self, key):\n        return key");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn drilling_an_unknown_node_fails() {
    let dir = project("leaf");
    let output = run_archscope(&dir, &["drill", "group:Nowhere"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unknown node group:Nowhere"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_archscope(Path::new("."), &["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
