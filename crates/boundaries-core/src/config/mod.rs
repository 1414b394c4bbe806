//! Boundary configuration driven by TOML.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! dto types
//!   ↓ validate + convert (loader)
//! BoundariesConfig (settings + rule families)
//!   ↓ Boundaries::new()
//! engine
//! ```

pub mod dto;
pub mod loader;

use std::path::Path;

use crate::rules::{
    ElementTypesRule, EntryPointRule, ExternalRule, NoIgnoredRule, NoPrivateRule,
    NoUnknownFilesRule, NoUnknownRule, RuleEntry,
};
use crate::selector::Selector;
use crate::settings::Settings;

pub use crate::error::ModelError;
pub use loader::LoadError;

/// Default configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &["boundaries.toml", ".boundaries.toml"];

/// Errors from reading, parsing and loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: String,
        /// Why it failed.
        source: std::io::Error,
    },

    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    Load(#[from] LoadError),
}

/// The enabled rule families; `None` means disabled.
#[derive(Debug, Clone, Default)]
pub struct RuleFamilies {
    /// `element-types`.
    pub element_types: Option<ElementTypesRule>,
    /// `entry-point`.
    pub entry_point: Option<EntryPointRule>,
    /// `external`.
    pub external: Option<ExternalRule>,
    /// `no-private`.
    pub no_private: Option<NoPrivateRule>,
    /// `no-unknown`.
    pub no_unknown: Option<NoUnknownRule>,
    /// `no-ignored`.
    pub no_ignored: Option<NoIgnoredRule>,
    /// `no-unknown-files`.
    pub no_unknown_files: Option<NoUnknownFilesRule>,
}

/// Validated configuration: settings plus rule families.
#[derive(Debug, Clone)]
pub struct BoundariesConfig {
    settings: Settings,
    families: RuleFamilies,
}

impl BoundariesConfig {
    /// Creates a configuration with cross-reference validation.
    ///
    /// # Errors
    ///
    /// Returns every selector that names an element type the catalog does
    /// not declare.
    pub fn new(settings: Settings, families: RuleFamilies) -> Result<Self, Vec<ModelError>> {
        let mut errors = Vec::new();

        if let Some(family) = &families.element_types {
            for (i, rule) in family.rules().iter().enumerate() {
                let ctx = format!("element-types.rules[{i}]");
                check_types(&settings, &format!("{ctx}.from"), &rule.subject, &mut errors);
                check_types(&settings, &format!("{ctx}.allow"), &rule.allow, &mut errors);
                check_types(&settings, &format!("{ctx}.disallow"), &rule.disallow, &mut errors);
            }
        }
        if let Some(family) = &families.entry_point {
            check_subjects(&settings, "entry-point", "target", family.rules(), &mut errors);
        }
        if let Some(family) = &families.external {
            check_subjects(&settings, "external", "from", family.rules(), &mut errors);
        }

        if errors.is_empty() {
            Ok(Self { settings, families })
        } else {
            Err(errors)
        }
    }

    /// Parses and validates TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if TOML parsing or model validation fails.
    pub fn parse(content: &str) -> Result<Self, LoadConfigError> {
        let dto: dto::BoundariesConfigDto = toml::from_str(content)?;
        Ok(loader::load(dto)?)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self, LoadConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::parse(&content)
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Enabled rule families.
    #[must_use]
    pub fn families(&self) -> &RuleFamilies {
        &self.families
    }

    /// Splits into settings and families.
    #[must_use]
    pub fn into_parts(self) -> (Settings, RuleFamilies) {
        (self.settings, self.families)
    }
}

fn check_subjects<T>(
    settings: &Settings,
    family: &str,
    field: &str,
    rules: &[RuleEntry<T>],
    errors: &mut Vec<ModelError>,
) {
    for (i, rule) in rules.iter().enumerate() {
        check_types(
            settings,
            &format!("{family}.rules[{i}].{field}"),
            &rule.subject,
            errors,
        );
    }
}

fn check_types(
    settings: &Settings,
    context: &str,
    selectors: &[Selector],
    errors: &mut Vec<ModelError>,
) {
    for selector in selectors {
        if let Some(name) = selector.literal_type() {
            if !settings.declares_type(name) {
                errors.push(ModelError::UnknownElementType {
                    context: context.to_string(),
                    name: name.to_string(),
                });
            }
        }
    }
}
