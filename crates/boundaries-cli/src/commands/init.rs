//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# boundaries configuration
#
# Elements are matched against project-relative paths, first match wins.
# Rules are evaluated in order; the first rule whose `from` matches decides.

[settings]
root-path = "."
ignore = ["**/*.test.js", "**/*.spec.js"]

[[elements]]
type = "helpers"
pattern = "helpers/*"
capture = ["name"]

[[elements]]
type = "components"
pattern = "components/*/*"
capture = ["family", "name"]

[[elements]]
type = "modules"
pattern = "modules/*"
capture = ["name"]

[element-types]
default = "disallow"

[[element-types.rules]]
from = "helpers"
allow = ["helpers"]

[[element-types.rules]]
from = "components"
# Components may only use components of their own family
allow = ["helpers", ["components", { family = "${from.family}" }]]

[[element-types.rules]]
from = "modules"
allow = ["helpers", "components", "modules"]

[entry-point]
default = "disallow"

[[entry-point.rules]]
target = ["helpers", "components", "modules"]
allow = "index.js"

# [external]
# default = "allow"
#
# [[external.rules]]
# from = "helpers"
# disallow = ["react"]

[no-private]
allow-uncles = true

[no-unknown]
"#;

/// Runs the init command.
pub fn run(project: &Path, force: bool) -> Result<()> {
    let config_path = project.join("boundaries.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit boundaries.toml to describe your elements");
    println!("  2. Run: boundaries elements");

    Ok(())
}
