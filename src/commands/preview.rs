//! `archscope preview` command.

use serde_json::{json, Value};

use super::Workspace;
use crate::drill::preview::fetch_code;
use crate::entity::FileEntities;

/// Execute the `preview` command.
///
/// Finds the innermost entity of `file` whose range contains `line` and
/// returns its source.
///
/// # Errors
///
/// Returns an error string if the file is missing, cannot be scanned or
/// read, or no entity encloses `line`.
pub async fn run(workspace: &Workspace<'_>, file: &str, line: u32) -> Result<Value, String> {
    let path = workspace.root.join(file);
    if !workspace.ctx.fs.exists(&path) {
        return Err(format!("No such file: {}", path.display()));
    }
    let entities = workspace
        .ctx
        .entities
        .entities(file)
        .await
        .map_err(|e| format!("Failed to scan {file}: {e}"))?;
    let snapshot = FileEntities::new(file, entities);

    let (_, entity) = snapshot
        .walk()
        .into_iter()
        .filter(|(_, e)| e.start.line <= line && line <= e.end.line)
        .max_by_key(|(depth, _)| *depth)
        .ok_or_else(|| format!("No entity encloses {file}:{line}"))?;

    let location = entity.location_in(file);
    let preview = fetch_code(workspace.ctx.fs.as_ref(), workspace.root, &location).map_err(|e| e.to_string())?;
    Ok(json!({
        "entity": entity.name,
        "kind": entity.kind.as_str(),
        "location": location,
        "preview": preview,
    }))
}
