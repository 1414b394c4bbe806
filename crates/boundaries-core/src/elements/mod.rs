//! Element catalog and classified element information.
//!
//! An [`ElementDescriptor`] describes one element type of the project
//! (e.g. "components live in `components/*`"). The ordered list of
//! descriptors is the catalog; [`classifier::ElementClassifier`] turns a file
//! path into an [`ElementInfo`] using it.

pub mod classifier;

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::matcher::CompiledPattern;

pub use classifier::ElementClassifier;

/// Named substrings captured from a path.
pub type CapturedValues = BTreeMap<String, String>;

/// How a descriptor pattern is matched against a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The pattern identifies a directory; every file below belongs to it.
    #[default]
    Folder,
    /// The pattern identifies a single file.
    File,
    /// The pattern must match the whole project-relative path.
    Full,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::File => write!(f, "file"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// One entry of the element catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementDescriptor {
    #[serde(rename = "type")]
    element_type: String,
    patterns: Vec<String>,
    mode: MatchMode,
    capture_names: Vec<String>,
    base_pattern: Option<String>,
    base_capture_names: Vec<String>,
}

impl ElementDescriptor {
    /// Creates a descriptor, validating names and compiling every pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the type is empty, no pattern is given, a pattern is
    /// malformed or a capture name is repeated.
    pub fn new(
        element_type: impl Into<String>,
        patterns: Vec<String>,
        mode: MatchMode,
        capture_names: Vec<String>,
    ) -> Result<Self, ModelError> {
        let element_type = element_type.into();
        if element_type.is_empty() {
            return Err(ModelError::EmptyElementType);
        }
        if patterns.is_empty() {
            return Err(ModelError::NoPatterns { element_type });
        }
        for (i, pattern) in patterns.iter().enumerate() {
            CompiledPattern::new(pattern).map_err(|e| ModelError::InvalidPattern {
                context: format!("element `{element_type}` pattern[{i}]"),
                source: e,
            })?;
        }
        check_unique(&element_type, &capture_names)?;

        Ok(Self {
            element_type,
            patterns,
            mode,
            capture_names,
            base_pattern: None,
            base_capture_names: Vec::new(),
        })
    }

    /// Adds a base pattern matched against the path preceding the element.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is malformed or a base capture name is
    /// repeated.
    pub fn with_base_pattern(
        mut self,
        base_pattern: impl Into<String>,
        base_capture_names: Vec<String>,
    ) -> Result<Self, ModelError> {
        let base_pattern = base_pattern.into();
        CompiledPattern::new(&base_pattern).map_err(|e| ModelError::InvalidPattern {
            context: format!("element `{}` base-pattern", self.element_type),
            source: e,
        })?;
        check_unique(&self.element_type, &base_capture_names)?;
        self.base_pattern = Some(base_pattern);
        self.base_capture_names = base_capture_names;
        Ok(self)
    }

    /// Returns the element type name.
    #[must_use]
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Returns the patterns, tried in order.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns the match mode.
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Returns the names given to captured positions.
    #[must_use]
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    /// Returns the base pattern, if any.
    #[must_use]
    pub fn base_pattern(&self) -> Option<&str> {
        self.base_pattern.as_deref()
    }

    /// Returns the names given to base-pattern captures.
    #[must_use]
    pub fn base_capture_names(&self) -> &[String] {
        &self.base_capture_names
    }
}

fn check_unique(element_type: &str, names: &[String]) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ModelError::DuplicateCaptureName {
                element_type: element_type.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// Pairs capture names with captured values; unnamed positions are dropped.
#[must_use]
pub fn name_captures(names: &[String], values: &[String]) -> CapturedValues {
    names
        .iter()
        .zip(values)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// An ancestor of a classified element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentElement {
    /// Element type of the ancestor.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Path of the ancestor's root.
    pub element_path: String,
    /// Values captured by the ancestor's pattern.
    pub captured_values: CapturedValues,
}

/// Classification of one project path.
///
/// When `element_type` is `None` the path matched no descriptor (or was
/// ignored): `parents` is then empty and `internal_path` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// The classified path.
    pub path: String,
    /// Element type, if the path belongs to an element.
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    /// Root of the element; always a prefix of `path`.
    pub element_path: Option<String>,
    /// Path of the file relative to the element root.
    pub internal_path: Option<String>,
    /// Values captured by the element's pattern.
    #[serde(default)]
    pub captured_values: CapturedValues,
    /// Enclosing elements, nearest first.
    #[serde(default)]
    pub parents: Vec<ParentElement>,
    /// True when include/ignore settings exclude the path.
    #[serde(default)]
    pub is_ignored: bool,
}

impl ElementInfo {
    /// An unclassified path.
    #[must_use]
    pub fn unknown(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// An ignored path.
    #[must_use]
    pub fn ignored(path: impl Into<String>) -> Self {
        Self {
            is_ignored: true,
            ..Self::unknown(path)
        }
    }

    /// Returns true if the path belongs to an element.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.element_type.is_some()
    }

    /// Returns the nearest enclosing element.
    #[must_use]
    pub fn nearest_parent(&self) -> Option<&ParentElement> {
        self.parents.first()
    }

    /// Returns true if `element_path` is one of this element's ancestors.
    #[must_use]
    pub fn has_ancestor(&self, element_path: &str) -> bool {
        self.parents.iter().any(|p| p.element_path == element_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn descriptor_valid() {
        let d = ElementDescriptor::new(
            "components",
            names(&["components/*"]),
            MatchMode::Folder,
            names(&["name"]),
        )
        .unwrap();
        assert_eq!(d.element_type(), "components");
        assert_eq!(d.mode(), MatchMode::Folder);
        assert!(d.base_pattern().is_none());
    }

    #[test]
    fn descriptor_rejects_empty_type() {
        assert_eq!(
            ElementDescriptor::new("", names(&["a/*"]), MatchMode::Folder, vec![]),
            Err(ModelError::EmptyElementType)
        );
    }

    #[test]
    fn descriptor_rejects_missing_patterns() {
        assert!(matches!(
            ElementDescriptor::new("a", vec![], MatchMode::Folder, vec![]),
            Err(ModelError::NoPatterns { .. })
        ));
    }

    #[test]
    fn descriptor_rejects_malformed_pattern() {
        let err =
            ElementDescriptor::new("a", names(&["a/{b"]), MatchMode::Folder, vec![]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidPattern { .. }));
        assert!(err.to_string().contains("pattern[0]"));
    }

    #[test]
    fn descriptor_rejects_duplicate_capture() {
        assert!(matches!(
            ElementDescriptor::new(
                "a",
                names(&["*/*"]),
                MatchMode::Folder,
                names(&["x", "x"])
            ),
            Err(ModelError::DuplicateCaptureName { .. })
        ));
    }

    #[test]
    fn base_pattern_validated() {
        let d = ElementDescriptor::new("a", names(&["a/*"]), MatchMode::Folder, vec![]).unwrap();
        assert!(d.clone().with_base_pattern("src/*", names(&["pkg"])).is_ok());
        assert!(d.with_base_pattern("src/{", vec![]).is_err());
    }

    #[test]
    fn extra_positions_are_dropped() {
        let captured = name_captures(&names(&["family"]), &names(&["atoms", "", "Button.js"]));
        assert_eq!(captured.len(), 1);
        assert_eq!(captured["family"], "atoms");
    }

    #[test]
    fn unknown_element_has_no_ancestry() {
        let info = ElementInfo::unknown("scripts/build.js");
        assert!(!info.is_known());
        assert!(info.parents.is_empty());
        assert!(info.internal_path.is_none());
        assert!(!info.is_ignored);
        assert!(ElementInfo::ignored("x").is_ignored);
    }
}
