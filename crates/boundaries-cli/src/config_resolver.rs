//! Finds the configuration file and builds the engine from it.
//!
//! `--config` is used as given. Otherwise the first existing file among
//! [`CONFIG_FILE_NAMES`] in the project directory wins, then `config.toml`
//! in `$BOUNDARIES_CONFIG_DIR` (or `~/.boundaries`). Without any of them
//! there is no element catalog, so loading fails.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use boundaries_core::config::CONFIG_FILE_NAMES;
use boundaries_core::{Boundaries, BoundariesConfig};

const GLOBAL_CONFIG_NAME: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "BOUNDARIES_CONFIG_DIR";

/// Builds the engine for `project`, honoring an explicit `--config` path.
///
/// # Errors
///
/// Returns error if no configuration exists or it fails to load.
pub fn resolve_engine(project: &Path, explicit: Option<&Path>) -> Result<Boundaries> {
    resolve_engine_in(project, explicit, global_config_dir())
}

fn resolve_engine_in(
    project: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> Result<Boundaries> {
    if let Some(path) = explicit {
        return load(path);
    }

    let candidates = candidates(project, global_dir);
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        let tried = candidates
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "No configuration found, tried:\n{tried}\n\
             Create one with `boundaries init` or pass --config."
        );
    };
    tracing::info!(config = %path.display(), "using configuration");
    load(path)
}

/// Lookup order after `--config`.
fn candidates(project: &Path, global_dir: Option<PathBuf>) -> Vec<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project.join(name))
        .chain(global_dir.map(|dir| dir.join(GLOBAL_CONFIG_NAME)))
        .collect()
}

fn load(path: &Path) -> Result<Boundaries> {
    let config = BoundariesConfig::from_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    Ok(Boundaries::new(config))
}

fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".boundaries"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog(element_type: &str) -> String {
        format!("[[elements]]\ntype = \"{element_type}\"\npattern = \"{element_type}/*\"\n")
    }

    fn knows(engine: &Boundaries, element_type: &str) -> bool {
        engine
            .describe_element(&format!("{element_type}/a/index.js"))
            .is_known()
    }

    #[test]
    fn explicit_path_beats_project_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("boundaries.toml"), catalog("helpers")).unwrap();
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, catalog("modules")).unwrap();

        let engine = resolve_engine_in(tmp.path(), Some(&explicit), None).unwrap();
        assert!(knows(&engine, "modules"));
        assert!(!knows(&engine, "helpers"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("boundaries.toml"), catalog("helpers")).unwrap();
        let missing = tmp.path().join("missing.toml");

        let err = resolve_engine_in(tmp.path(), Some(&missing), None).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn project_file_names_in_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".boundaries.toml"), catalog("modules")).unwrap();
        let engine = resolve_engine_in(tmp.path(), None, None).unwrap();
        assert!(knows(&engine, "modules"));

        fs::write(tmp.path().join("boundaries.toml"), catalog("helpers")).unwrap();
        let engine = resolve_engine_in(tmp.path(), None, None).unwrap();
        assert!(knows(&engine, "helpers"));
    }

    #[test]
    fn global_directory_is_the_last_resort() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join(GLOBAL_CONFIG_NAME), catalog("shared")).unwrap();

        let dir = Some(global.path().to_path_buf());
        let engine = resolve_engine_in(project.path(), None, dir.clone()).unwrap();
        assert!(knows(&engine, "shared"));

        fs::write(project.path().join("boundaries.toml"), catalog("helpers")).unwrap();
        let engine = resolve_engine_in(project.path(), None, dir).unwrap();
        assert!(!knows(&engine, "shared"));
    }

    #[test]
    fn no_configuration_lists_every_candidate() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();

        let err = resolve_engine_in(project.path(), None, Some(global.path().to_path_buf()))
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("No configuration found"));
        for name in CONFIG_FILE_NAMES {
            assert!(err.contains(&project.path().join(name).display().to_string()));
        }
        assert!(err.contains(&global.path().join(GLOBAL_CONFIG_NAME).display().to_string()));
    }

    #[test]
    fn invalid_configuration_reports_cause() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("boundaries.toml"),
            "[[elements]]\ntype = \"\"\npattern = \"a/*\"\n",
        )
        .unwrap();

        let err = resolve_engine_in(tmp.path(), None, None).unwrap_err();
        assert!(format!("{err:#}").contains("element type must not be empty"));
    }
}
