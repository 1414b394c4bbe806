//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::Deserialize;

use crate::selector::{OneOrMany, RawSelector};

/// Raw TOML representation of `boundaries.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BoundariesConfigDto {
    /// Global settings.
    #[serde(default)]
    pub settings: SettingsDto,

    /// Element catalog, in priority order.
    #[serde(default)]
    pub elements: Vec<ElementDto>,

    /// `[element-types]` rule family.
    #[serde(default)]
    pub element_types: Option<RuleFamilyDto<RawSelector>>,

    /// `[entry-point]` rule family.
    #[serde(default)]
    pub entry_point: Option<RuleFamilyDto<OneOrMany>>,

    /// `[external]` rule family.
    #[serde(default)]
    pub external: Option<RuleFamilyDto<RawExternalSelector>>,

    /// `[no-private]` rule.
    #[serde(default)]
    pub no_private: Option<NoPrivateDto>,

    /// `[no-unknown]` rule.
    #[serde(default)]
    pub no_unknown: Option<ToggleDto>,

    /// `[no-ignored]` rule.
    #[serde(default)]
    pub no_ignored: Option<ToggleDto>,

    /// `[no-unknown-files]` rule.
    #[serde(default)]
    pub no_unknown_files: Option<ToggleDto>,
}

/// TOML representation of `[settings]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsDto {
    /// Project root used to relativize resolved paths.
    #[serde(default)]
    pub root_path: Option<String>,
    /// Include patterns.
    #[serde(default)]
    pub include: Vec<String>,
    /// Ignore patterns.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Override of the runtime built-in module list.
    #[serde(default)]
    pub built_in_modules: Option<Vec<String>>,
    /// External-flagging policy.
    #[serde(default)]
    pub flag_as_external: Option<FlagAsExternalDto>,
}

/// TOML representation of `[settings.flag-as-external]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FlagAsExternalDto {
    /// Default: true.
    #[serde(default)]
    pub unresolvable_alias: Option<bool>,
    /// Default: true.
    #[serde(default)]
    pub in_node_modules: Option<bool>,
    /// Default: false.
    #[serde(default)]
    pub outside_root_path: Option<bool>,
    /// Specifier patterns always treated as external.
    #[serde(default)]
    pub custom_source_patterns: Vec<String>,
}

/// TOML representation of one `[[elements]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ElementDto {
    /// Element type name.
    #[serde(rename = "type")]
    pub element_type: String,
    /// One or more patterns.
    pub pattern: OneOrMany,
    /// `folder` (default), `file` or `full`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Names for captured positions.
    #[serde(default)]
    pub capture: Vec<String>,
    /// Pattern the path before the element must match.
    #[serde(default)]
    pub base_pattern: Option<String>,
    /// Names for base-pattern captures.
    #[serde(default)]
    pub base_capture: Vec<String>,
}

/// TOML representation of a rule family with ordered rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleFamilyDto<T> {
    /// `allow` or `disallow` (default: "disallow").
    #[serde(default)]
    pub default: Option<String>,
    /// Family-wide message template.
    #[serde(default)]
    pub message: Option<String>,
    /// Severity (default: "error").
    #[serde(default)]
    pub severity: Option<String>,
    /// Ordered rules.
    #[serde(default = "Vec::new")]
    pub rules: Vec<RuleDto<T>>,
}

/// TOML representation of one ordered rule.
///
/// `from` is the subject of `element-types` and `external` rules; `target`
/// is the subject of `entry-point` rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleDto<T> {
    /// Subject selectors (importing element).
    #[serde(default)]
    pub from: Option<RawSelector>,
    /// Subject selectors (imported element).
    #[serde(default)]
    pub target: Option<RawSelector>,
    /// Permitted entries.
    #[serde(default = "Option::default")]
    pub allow: Option<ListOrOne<T>>,
    /// Denied entries.
    #[serde(default = "Option::default")]
    pub disallow: Option<ListOrOne<T>>,
    /// Import kind pattern.
    #[serde(default)]
    pub import_kind: Option<String>,
    /// Message template.
    #[serde(default)]
    pub message: Option<String>,
}

/// A single entry or a list of entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListOrOne<T> {
    /// Several entries.
    List(Vec<T>),
    /// One entry.
    One(T),
}

impl<T> ListOrOne<T> {
    /// Returns the entries as a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// External module selector as written in configuration.
///
/// ```toml
/// allow = ["react", ["lodash", { specifiers = ["get"] }]]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawExternalSelector {
    /// Whole module.
    Module(String),
    /// Module narrowed by options.
    WithOptions(String, ExternalOptionsDto),
}

/// Options narrowing an external module selector.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExternalOptionsDto {
    /// Imported name patterns.
    #[serde(default)]
    pub specifiers: Vec<String>,
    /// Sub path patterns.
    #[serde(default)]
    pub path: Option<OneOrMany>,
}

/// TOML representation of `[no-private]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NoPrivateDto {
    /// Default: true.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Default: true.
    #[serde(default = "default_true")]
    pub allow_uncles: bool,
    /// Message template.
    #[serde(default)]
    pub message: Option<String>,
    /// Severity (default: "error").
    #[serde(default)]
    pub severity: Option<String>,
}

/// TOML representation of rules that are only switched on or off.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToggleDto {
    /// Default: true.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Message template.
    #[serde(default)]
    pub message: Option<String>,
    /// Severity (default: "error").
    #[serde(default)]
    pub severity: Option<String>,
}

fn default_true() -> bool {
    true
}
