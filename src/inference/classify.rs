//! Directory/filename heuristic used when no inference collaborator is set up.

use std::collections::BTreeMap;

use crate::config::DEFAULT_GROUP;

/// Bucket for UI and request-handling code.
pub const PRESENTATION: &str = "Presentation";
/// Bucket for domain logic.
pub const BUSINESS_LOGIC: &str = "Business Logic";
/// Bucket for persistence code.
pub const DATA_ACCESS: &str = "Data Access";
/// Bucket for plumbing, config and deployment.
pub const INFRASTRUCTURE: &str = "Infrastructure";
/// Bucket for tests.
pub const TESTS: &str = "Tests";

const TEST_MARKERS: &[&str] = &["test", "spec", "__tests__", "fixture"];

/// Buckets in priority order, with their path and filename markers.
const BUCKETS: &[(&str, &[&str], &[&str])] = &[
    (
        PRESENTATION,
        &["ui", "view", "views", "components", "pages", "screens", "widgets", "web", "frontend", "routes", "controllers", "handlers", "cli"],
        &["view", "component", "page", "screen", "widget", "controller", "handler", "route", "panel", "render"],
    ),
    (
        DATA_ACCESS,
        &["data", "db", "database", "models", "model", "entities", "repositories", "repository", "storage", "store", "persistence", "migrations", "schema"],
        &["repo", "repository", "model", "entity", "schema", "dao", "store", "migration", "query"],
    ),
    (
        BUSINESS_LOGIC,
        &["services", "service", "domain", "core", "logic", "usecases", "features", "engine"],
        &["service", "manager", "usecase", "engine", "workflow", "policy", "rule"],
    ),
    (
        INFRASTRUCTURE,
        &["infra", "infrastructure", "config", "deploy", "scripts", "build", "ci", "docker", "net", "network", "http", "api", "adapters", "platform"],
        &["config", "settings", "client", "server", "adapter", "provider", "logger", "setup", "main", "index"],
    ),
];

/// Splits a path into lowercase directory segments, the file stem and the
/// file name tokens (split on `.`, `_` and `-`).
fn split(path: &str) -> (Vec<String>, String, Vec<String>) {
    let lower = path.to_ascii_lowercase();
    let mut segments: Vec<String> = lower.split('/').map(String::from).collect();
    let file = segments.pop().unwrap_or_default();
    let stem = file.split('.').next().unwrap_or_default().to_string();
    let tokens = file.split(['.', '_', '-']).map(String::from).collect();
    (segments, stem, tokens)
}

/// Classifies one path into a bucket name.
///
/// Test markers win over everything; otherwise the first bucket whose
/// directory markers match, then the first whose filename markers match,
/// then [`DEFAULT_GROUP`].
#[must_use]
pub fn classify(path: &str) -> &'static str {
    let (dirs, stem, tokens) = split(path);

    let is_test_dir =
        |d: &String| TEST_MARKERS.iter().any(|m| d.as_str() == *m || *d == format!("{m}s"));
    if dirs.iter().any(is_test_dir) || tokens.iter().any(|t| TEST_MARKERS.contains(&t.as_str())) {
        return TESTS;
    }

    for (bucket, dir_markers, _) in BUCKETS {
        if dirs.iter().any(|d| dir_markers.contains(&d.as_str())) {
            return *bucket;
        }
    }
    for (bucket, _, file_markers) in BUCKETS {
        if file_markers.iter().any(|m| stem.contains(m)) {
            return *bucket;
        }
    }
    DEFAULT_GROUP
}

/// Classifies every path.
#[must_use]
pub fn classify_all(paths: &[String]) -> BTreeMap<String, String> {
    paths.iter().map(|p| (p.clone(), classify(p).to_string())).collect()
}
