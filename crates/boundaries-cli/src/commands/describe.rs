//! `describe-element` and `describe-dependency` commands.

use anyhow::Result;
use boundaries_core::{Boundaries, DependencyEdge, ImportKind};

/// Prints the classification of `path` as JSON.
pub fn element(engine: &Boundaries, path: &str) -> Result<()> {
    let info = engine.describe_element(path);
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

/// Prints the description of one import as JSON.
pub fn dependency(
    engine: &Boundaries,
    from: &str,
    specifier: &str,
    resolved: Option<String>,
    kind: ImportKind,
    specifiers: Vec<String>,
) -> Result<()> {
    let mut edge = DependencyEdge::new(specifier).kind(kind).specifiers(specifiers);
    if let Some(resolved) = resolved {
        edge = edge.resolved(resolved);
    }
    let description = engine.describe_dependency(from, &edge);
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}
