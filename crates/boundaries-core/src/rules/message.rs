//! Violation message rendering.
//!
//! Custom messages are templates over the two ends of the dependency:
//!
//! | Placeholder                         | Value                                |
//! |-------------------------------------|--------------------------------------|
//! | `${file.type}` / `${from.type}`     | element type of the importing file   |
//! | `${file.<capture>}`                 | captured value of the importing file |
//! | `${dependency.type}`                | element type of the imported file    |
//! | `${dependency.<capture>}`           | captured value of the imported file  |
//! | `${dependency.source}`              | the import specifier                 |
//! | `${dependency.internalPath}`        | path inside the imported element     |
//! | `${dependency.relationship}`        | relationship of target to source     |
//! | `${dependency.importKind}`          | `value` or `type`                    |
//! | `${dependency.specifiers}`          | imported names, comma separated      |
//! | `${dependency.baseModule}`          | external package name                |
//!
//! `target.*` and `to.*` are aliases of `dependency.*`.

use crate::dependency::DependencyDescription;
use crate::elements::ElementInfo;
use crate::rules::RuleVerdict;
use crate::selector::{element_value, render_template};

/// Renders a custom message for a dependency.
#[must_use]
pub fn render(template: &str, dependency: &DependencyDescription) -> String {
    render_template(template, |key| lookup(key, dependency))
}

/// Renders a custom message for a single file.
#[must_use]
pub fn render_file(template: &str, file: &ElementInfo) -> String {
    render_template(template, |key| {
        let name = key.strip_prefix("file.").or_else(|| key.strip_prefix("from."))?;
        element_value(file, name)
    })
}

fn lookup(key: &str, dependency: &DependencyDescription) -> Option<String> {
    if let Some(name) = key.strip_prefix("file.").or_else(|| key.strip_prefix("from.")) {
        return element_value(&dependency.from, name);
    }
    let name = key
        .strip_prefix("dependency.")
        .or_else(|| key.strip_prefix("target."))
        .or_else(|| key.strip_prefix("to."))?;
    match name {
        "source" => Some(dependency.to.source.clone()),
        "relationship" => Some(dependency.relationship.to_string()),
        "importKind" | "import_kind" => Some(dependency.import_kind.to_string()),
        "specifiers" => Some(dependency.specifiers.join(", ")),
        "baseModule" | "base_module" => dependency.to.origin.base_module.clone(),
        _ => element_value(&dependency.to.element, name),
    }
}

/// `'type'` or `'unknown'` for messages.
#[must_use]
pub fn type_label(element: &ElementInfo) -> String {
    format!("'{}'", element.element_type.as_deref().unwrap_or("unknown"))
}

/// Trailing sentence naming the governing rule, 1-based.
#[must_use]
pub fn rule_suffix(verdict: &RuleVerdict) -> String {
    match verdict.governing_rule {
        Some(index) => format!(". Denied by rule at index {}", index + 1),
        None => ". No rule allows it".to_string(),
    }
}
