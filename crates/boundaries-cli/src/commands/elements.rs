//! Elements command: classify every file below a directory.

use anyhow::{Context, Result};
use boundaries_core::{Boundaries, ElementInfo};
use ignore::WalkBuilder;
use std::path::Path;

use crate::OutputFormat;

/// Runs the elements command.
pub fn run(engine: &Boundaries, root: &Path, format: OutputFormat) -> Result<()> {
    let elements = classify_tree(engine, root)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&elements)?),
        OutputFormat::Text | OutputFormat::Compact => {
            for info in &elements {
                println!("{}", describe_line(info));
            }
            let known = elements.iter().filter(|e| e.is_known()).count();
            println!(
                "\n{} file(s), {} in elements, {} ignored",
                elements.len(),
                known,
                elements.iter().filter(|e| e.is_ignored).count()
            );
        }
    }
    Ok(())
}

/// Walks `root` honoring `.gitignore` and classifies each file by its
/// path relative to `root`.
///
/// # Errors
///
/// Returns error if the directory cannot be walked.
pub fn classify_tree(engine: &Boundaries, root: &Path) -> Result<Vec<ElementInfo>> {
    let mut elements = Vec::new();
    for entry in WalkBuilder::new(root).build() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        elements.push(engine.describe_element(&path));
    }
    elements.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(files = elements.len(), root = %root.display(), "classified tree");
    Ok(elements)
}

fn describe_line(info: &ElementInfo) -> String {
    match (&info.element_type, &info.element_path) {
        (Some(element_type), Some(element_path)) => {
            format!("{}  {} ({})", info.path, element_type, element_path)
        }
        _ if info.is_ignored => format!("{}  <ignored>", info.path),
        _ => format!("{}  <unknown>", info.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn classifies_relative_paths() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("helpers/date")).unwrap();
        fs::create_dir_all(tmp.path().join("scripts")).unwrap();
        fs::write(tmp.path().join("helpers/date/index.js"), "").unwrap();
        fs::write(tmp.path().join("scripts/build.js"), "").unwrap();

        let engine = Boundaries::from_toml(
            "[[elements]]\ntype = \"helpers\"\npattern = \"helpers/*\"\ncapture = [\"name\"]\n",
        )
        .unwrap();
        let elements = classify_tree(&engine, tmp.path()).unwrap();

        let paths: Vec<_> = elements.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["helpers/date/index.js", "scripts/build.js"]);
        assert_eq!(elements[0].captured_values["name"], "date");
        assert!(!elements[1].is_known());
        assert_eq!(describe_line(&elements[1]), "scripts/build.js  <unknown>");
    }
}
