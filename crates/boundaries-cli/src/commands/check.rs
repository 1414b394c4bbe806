//! Check command implementation.

use anyhow::{Context, Result};
use boundaries_core::{Boundaries, CacheError, DependencyEdge, ImportKind};
use serde::Deserialize;
use std::path::Path;

use crate::OutputFormat;

/// One import as listed in the edges file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportRecord {
    /// Project-relative path of the importing file.
    pub file: String,
    /// Specifier as written in source.
    pub source: String,
    /// Path the host resolved the specifier to.
    #[serde(default)]
    pub resolved: Option<String>,
    /// `value` (default) or `type`.
    #[serde(default)]
    pub kind: ImportKind,
    /// Imported names.
    #[serde(default)]
    pub specifiers: Vec<String>,
    /// Line of the import statement.
    #[serde(default = "first")]
    pub line: usize,
    /// Column of the import statement.
    #[serde(default = "first")]
    pub column: usize,
}

fn first() -> usize {
    1
}

impl ImportRecord {
    fn edge(&self) -> DependencyEdge {
        let edge = DependencyEdge::new(&self.source)
            .kind(self.kind)
            .specifiers(self.specifiers.clone());
        match &self.resolved {
            Some(resolved) => edge.resolved(resolved),
            None => edge,
        }
    }
}

/// Parses the edges file content.
///
/// # Errors
///
/// Returns error if the content is not a JSON array of import records.
pub fn parse_records(content: &str) -> Result<Vec<ImportRecord>> {
    serde_json::from_str(content).context("Edges file must be a JSON array of imports")
}

/// Runs the check command.
pub fn run(
    engine: &Boundaries,
    edges_path: &Path,
    format: OutputFormat,
    cache_path: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(edges_path)
        .with_context(|| format!("Failed to read edges: {}", edges_path.display()))?;
    let records = parse_records(&content)
        .with_context(|| format!("Invalid edges file: {}", edges_path.display()))?;

    if let Some(path) = cache_path {
        restore_cache(engine, path)?;
    }

    tracing::info!(
        "Checking {} import(s) with {} rule(s)",
        records.len(),
        engine.rule_count()
    );

    let edges: Vec<DependencyEdge> = records.iter().map(ImportRecord::edge).collect();
    let result = engine.check_all(
        records
            .iter()
            .zip(&edges)
            .map(|(r, edge)| (r.file.as_str(), edge, r.line, r.column)),
    );

    if let Some(path) = cache_path {
        let json = engine.serialize_cache().context("Failed to serialize cache")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write cache: {}", path.display()))?;
    }

    super::output::print(&result, format)?;

    // Exit with error code if there are errors
    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Loads a snapshot if one exists; snapshots of other settings are skipped.
fn restore_cache(engine: &Boundaries, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache: {}", path.display()))?;
    match engine.restore_cache(&json) {
        Ok(()) => Ok(()),
        Err(CacheError::FingerprintMismatch { .. }) => {
            tracing::warn!("Ignoring cache from other settings: {}", path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Invalid cache: {}", path.display())),
    }
}
