//! Dependency edges and their full description.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::elements::{ElementClassifier, ElementInfo};
use crate::origin::{OriginClassifier, OriginInfo};
use crate::relationship::{relationship, Relationship};

/// Whether an import brings in values or only types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// Runtime import.
    #[default]
    Value,
    /// Type-only import.
    Type,
}

impl ImportKind {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(Self::Value),
            "type" => Ok(Self::Type),
            other => Err(format!("unknown import kind `{other}` (expected value|type)")),
        }
    }
}

/// One import/export statement as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The specifier as written in source.
    pub source: String,
    /// The file the host resolved the specifier to.
    #[serde(default)]
    pub resolved_path: Option<String>,
    /// Value or type import.
    #[serde(default)]
    pub kind: ImportKind,
    /// Imported names.
    #[serde(default)]
    pub specifiers: Vec<String>,
}

impl DependencyEdge {
    /// Creates an unresolved value import.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Sets the resolved path.
    #[must_use]
    pub fn resolved(mut self, path: impl Into<String>) -> Self {
        self.resolved_path = Some(path.into());
        self
    }

    /// Sets the import kind.
    #[must_use]
    pub fn kind(mut self, kind: ImportKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the imported names.
    #[must_use]
    pub fn specifiers(mut self, specifiers: Vec<String>) -> Self {
        self.specifiers = specifiers;
        self
    }
}

/// The dependency target: its element classification plus origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Element classification of the resolved file (unknown if not local).
    pub element: ElementInfo,
    /// Origin of the import.
    pub origin: OriginInfo,
    /// The specifier as written in source.
    pub source: String,
}

impl TargetInfo {
    /// True when the target is a local, non-ignored element of the project.
    #[must_use]
    pub fn is_local_element(&self) -> bool {
        self.origin.is_local() && !self.is_ignored() && self.element.is_known()
    }

    /// True when the target is excluded by include/ignore settings.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.origin.is_ignored || self.element.is_ignored
    }
}

/// Everything the rule families need to judge one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescription {
    /// The importing file.
    pub from: ElementInfo,
    /// The imported module.
    pub to: TargetInfo,
    /// Structural relationship of `to` relative to `from`.
    pub relationship: Relationship,
    /// Value or type import.
    pub import_kind: ImportKind,
    /// Imported names.
    pub specifiers: Vec<String>,
}

/// Combines element and origin classification into descriptions.
#[derive(Debug)]
pub struct DependencyDescriber {
    elements: Arc<ElementClassifier>,
    origins: Arc<OriginClassifier>,
}

impl DependencyDescriber {
    /// Creates a describer over the engine's classifiers.
    #[must_use]
    pub fn new(elements: Arc<ElementClassifier>, origins: Arc<OriginClassifier>) -> Self {
        Self { elements, origins }
    }

    /// Describes the dependency of `from_path` on `edge`.
    #[must_use]
    pub fn describe(&self, from_path: &str, edge: &DependencyEdge) -> DependencyDescription {
        let from = self.elements.classify(from_path);
        let origin = self
            .origins
            .classify(&edge.source, edge.resolved_path.as_deref());

        let element = match (&origin.resolved_path, origin.is_local()) {
            (Some(resolved), true) => self.elements.classify(resolved),
            _ => ElementInfo::unknown(origin.resolved_path.clone().unwrap_or_default()),
        };
        let to = TargetInfo {
            element,
            origin,
            source: edge.source.clone(),
        };
        let relationship = if to.is_local_element() {
            relationship(&from, &to.element)
        } else {
            Relationship::None
        };

        tracing::debug!(
            from = from_path,
            source = %edge.source,
            relationship = %relationship,
            "described dependency"
        );

        DependencyDescription {
            from,
            to,
            relationship,
            import_kind: edge.kind,
            specifiers: edge.specifiers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheLayer;
    use crate::elements::{ElementDescriptor, MatchMode};
    use crate::matcher::PathMatcher;
    use crate::settings::Settings;

    fn describer() -> DependencyDescriber {
        let settings = Settings::new(vec![
            ElementDescriptor::new(
                "modules",
                vec!["modules/*".into()],
                MatchMode::Folder,
                vec!["name".into()],
            )
            .unwrap(),
            ElementDescriptor::new(
                "helpers",
                vec!["helpers/*".into()],
                MatchMode::Folder,
                vec!["name".into()],
            )
            .unwrap(),
        ])
        .with_ignore(vec!["**/*.spec.js".into()])
        .unwrap();
        let settings = Arc::new(settings);
        let cache = Arc::new(CacheLayer::new(settings.fingerprint()));
        let matcher = Arc::new(PathMatcher::new(Arc::clone(&cache)));
        DependencyDescriber::new(
            Arc::new(ElementClassifier::new(
                Arc::clone(&settings),
                Arc::clone(&matcher),
                Arc::clone(&cache),
            )),
            Arc::new(OriginClassifier::new(settings, matcher, cache)),
        )
    }

    #[test]
    fn local_dependency() {
        let d = describer().describe(
            "modules/a/index.js",
            &DependencyEdge::new("../../helpers/date")
                .resolved("helpers/date/index.js")
                .specifiers(vec!["format".into()]),
        );
        assert_eq!(d.to.element.element_type.as_deref(), Some("helpers"));
        assert!(d.to.origin.is_local());
        assert!(d.to.is_local_element());
        assert_eq!(d.relationship, Relationship::None);
        assert_eq!(d.specifiers, vec!["format".to_string()]);
    }

    #[test]
    fn nested_dependency_has_relationship() {
        let d = describer().describe(
            "modules/a/index.js",
            &DependencyEdge::new("./modules/b").resolved("modules/a/modules/b/index.js"),
        );
        assert_eq!(d.relationship, Relationship::Child);
    }

    #[test]
    fn external_target_has_no_element() {
        let d = describer().describe(
            "modules/a/index.js",
            &DependencyEdge::new("react").kind(ImportKind::Type),
        );
        assert!(d.to.origin.is_external());
        assert!(!d.to.element.is_known());
        assert_eq!(d.relationship, Relationship::None);
        assert_eq!(d.import_kind, ImportKind::Type);
    }

    #[test]
    fn ignored_target() {
        let d = describer().describe(
            "modules/a/index.js",
            &DependencyEdge::new("./a.spec").resolved("modules/a/a.spec.js"),
        );
        assert!(d.to.is_ignored());
        assert!(!d.to.is_local_element());
        assert_eq!(d.relationship, Relationship::None);
    }

    #[test]
    fn import_kind_parses() {
        assert_eq!("type".parse::<ImportKind>(), Ok(ImportKind::Type));
        assert!("both".parse::<ImportKind>().is_err());
    }
}
