//! Engine settings: element catalog, include/ignore lists and origin policy.

use serde::Serialize;

use crate::cache;
use crate::elements::ElementDescriptor;
use crate::error::ModelError;
use crate::matcher::{CompiledPattern, PathMatcher};
use crate::origin::NODE_BUILT_IN_MODULES;

/// Which dependencies are reported as external even though they resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagAsExternal {
    /// Unresolved non-relative specifiers (e.g. broken aliases).
    pub unresolvable_alias: bool,
    /// Resolved paths below a `node_modules` directory.
    pub in_node_modules: bool,
    /// Resolved paths outside the project root.
    pub outside_root_path: bool,
    /// Specifiers matching any of these globs.
    pub custom_source_patterns: Vec<String>,
}

impl Default for FlagAsExternal {
    fn default() -> Self {
        Self {
            unresolvable_alias: true,
            in_node_modules: true,
            outside_root_path: false,
            custom_source_patterns: Vec::new(),
        }
    }
}

/// Immutable settings of one engine instance.
///
/// The [`fingerprint`](Settings::fingerprint) of the serialized settings keys
/// the engine's caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    elements: Vec<ElementDescriptor>,
    include: Vec<String>,
    ignore: Vec<String>,
    root_path: String,
    flag_as_external: FlagAsExternal,
    built_in_modules: Vec<String>,
}

impl Settings {
    /// Creates settings for the given catalog with default policies.
    #[must_use]
    pub fn new(elements: Vec<ElementDescriptor>) -> Self {
        Self {
            elements,
            include: Vec::new(),
            ignore: Vec::new(),
            root_path: ".".to_string(),
            flag_as_external: FlagAsExternal::default(),
            built_in_modules: NODE_BUILT_IN_MODULES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Restricts analysis to paths matching at least one pattern.
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is malformed.
    pub fn with_include(mut self, include: Vec<String>) -> Result<Self, ModelError> {
        validate_patterns("settings.include", &include)?;
        self.include = include;
        Ok(self)
    }

    /// Excludes paths matching any pattern.
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is malformed.
    pub fn with_ignore(mut self, ignore: Vec<String>) -> Result<Self, ModelError> {
        validate_patterns("settings.ignore", &ignore)?;
        self.ignore = ignore;
        Ok(self)
    }

    /// Sets the project root used to relativize resolved paths.
    #[must_use]
    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        let root = root_path.into().replace('\\', "/");
        let trimmed = root.trim_end_matches('/');
        self.root_path = if trimmed.is_empty() && root.starts_with('/') {
            "/".to_string()
        } else if trimmed.is_empty() {
            ".".to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    /// Sets the external-flagging policy.
    ///
    /// # Errors
    ///
    /// Returns error if a custom source pattern is malformed.
    pub fn with_flag_as_external(mut self, policy: FlagAsExternal) -> Result<Self, ModelError> {
        validate_patterns(
            "settings.flag-as-external.custom-source-patterns",
            &policy.custom_source_patterns,
        )?;
        self.flag_as_external = policy;
        Ok(self)
    }

    /// Replaces the list of runtime built-in module names.
    #[must_use]
    pub fn with_built_in_modules(mut self, modules: Vec<String>) -> Self {
        self.built_in_modules = modules;
        self
    }

    /// The element catalog, in priority order.
    #[must_use]
    pub fn elements(&self) -> &[ElementDescriptor] {
        &self.elements
    }

    /// Include patterns.
    #[must_use]
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Ignore patterns.
    #[must_use]
    pub fn ignore(&self) -> &[String] {
        &self.ignore
    }

    /// Project root.
    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// External-flagging policy.
    #[must_use]
    pub fn flag_as_external(&self) -> &FlagAsExternal {
        &self.flag_as_external
    }

    /// Runtime built-in module names.
    #[must_use]
    pub fn built_in_modules(&self) -> &[String] {
        &self.built_in_modules
    }

    /// Returns true if the declared element type exists in the catalog.
    #[must_use]
    pub fn declares_type(&self, element_type: &str) -> bool {
        self.elements.iter().any(|e| e.element_type() == element_type)
    }

    /// A path is ignored when it matches an ignore pattern, or when an
    /// include list is set and the path matches none of it.
    #[must_use]
    pub fn is_ignored(&self, path: &str, matcher: &PathMatcher) -> bool {
        if matcher.is_match(path, &self.ignore) {
            return true;
        }
        !self.include.is_empty() && !matcher.is_match(path, &self.include)
    }

    /// BLAKE3 fingerprint of these settings.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        cache::fingerprint(self)
    }
}

fn validate_patterns(context: &str, patterns: &[String]) -> Result<(), ModelError> {
    for (i, pattern) in patterns.iter().enumerate() {
        CompiledPattern::new(pattern).map_err(|e| ModelError::InvalidPattern {
            context: format!("{context}[{i}]"),
            source: e,
        })?;
    }
    Ok(())
}
