//! Structural relationship between two classified elements.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::elements::ElementInfo;

/// What the target of a dependency is, relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// Both files belong to the same element.
    Internal,
    /// The target is directly inside the source.
    Child,
    /// The target is somewhere inside the source.
    Descendant,
    /// Both share the same nearest parent.
    Sibling,
    /// The target directly contains the source.
    Parent,
    /// The target is a sibling of one of the source's ancestors.
    Uncle,
    /// The target contains the source, at any depth.
    Ancestor,
    /// No structural relationship.
    None,
}

impl Relationship {
    /// All variants, in decision order.
    pub const ALL: [Self; 8] = [
        Self::Internal,
        Self::Child,
        Self::Descendant,
        Self::Sibling,
        Self::Parent,
        Self::Uncle,
        Self::Ancestor,
        Self::None,
    ];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::Sibling => "sibling",
            Self::Parent => "parent",
            Self::Uncle => "uncle",
            Self::Ancestor => "ancestor",
            Self::None => "none",
        }
    }

    /// The relationship seen from the other end.
    ///
    /// `Uncle` has no single mirror (the inverse is a nephew, which is not a
    /// named relationship) and maps to `None`.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Child => Self::Parent,
            Self::Parent => Self::Child,
            Self::Descendant => Self::Ancestor,
            Self::Ancestor => Self::Descendant,
            Self::Uncle => Self::None,
            other => other,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the relationship of `to` as seen from `from`.
///
/// Unknown elements on either side are never related.
#[must_use]
pub fn relationship(from: &ElementInfo, to: &ElementInfo) -> Relationship {
    let (Some(from_path), Some(to_path)) =
        (from.element_path.as_deref(), to.element_path.as_deref())
    else {
        return Relationship::None;
    };
    if !from.is_known() || !to.is_known() {
        return Relationship::None;
    }

    let from_parent = from.nearest_parent().map(|p| p.element_path.as_str());
    let to_parent = to.nearest_parent().map(|p| p.element_path.as_str());

    if from_path == to_path {
        Relationship::Internal
    } else if to_parent == Some(from_path) {
        Relationship::Child
    } else if to.has_ancestor(from_path) {
        Relationship::Descendant
    } else if from_parent.is_some() && from_parent == to_parent {
        Relationship::Sibling
    } else if from_parent == Some(to_path) {
        Relationship::Parent
    } else if to_parent.is_some_and(|p| from.has_ancestor(p)) {
        Relationship::Uncle
    } else if from.has_ancestor(to_path) {
        Relationship::Ancestor
    } else {
        Relationship::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{CapturedValues, ParentElement};

    /// Builds a `modules` element at `path` whose ancestors are the
    /// successive `modules/<x>` prefixes of the path.
    fn module(path: &str) -> ElementInfo {
        let segments: Vec<&str> = path.split('/').collect();
        let mut parents: Vec<ParentElement> = (2..segments.len())
            .step_by(2)
            .map(|end| ParentElement {
                element_type: "modules".into(),
                element_path: segments[..end].join("/"),
                captured_values: CapturedValues::new(),
            })
            .collect();
        parents.reverse();
        ElementInfo {
            path: format!("{path}/index.js"),
            element_type: Some("modules".into()),
            element_path: Some(path.into()),
            internal_path: Some("index.js".into()),
            captured_values: CapturedValues::new(),
            parents,
            is_ignored: false,
        }
    }

    #[test]
    fn internal() {
        assert_eq!(
            relationship(&module("modules/a"), &module("modules/a")),
            Relationship::Internal
        );
    }

    #[test]
    fn child_and_parent() {
        let a = module("modules/a");
        let b = module("modules/a/modules/b");
        assert_eq!(relationship(&a, &b), Relationship::Child);
        assert_eq!(relationship(&b, &a), Relationship::Parent);
    }

    #[test]
    fn descendant_and_ancestor() {
        let a = module("modules/a");
        let c = module("modules/a/modules/b/modules/c");
        assert_eq!(relationship(&a, &c), Relationship::Descendant);
        assert_eq!(relationship(&c, &a), Relationship::Ancestor);
    }

    #[test]
    fn sibling() {
        let b = module("modules/a/modules/b");
        let d = module("modules/a/modules/d");
        assert_eq!(relationship(&b, &d), Relationship::Sibling);
        assert_eq!(relationship(&d, &b), Relationship::Sibling);
    }

    #[test]
    fn uncle() {
        let c = module("modules/a/modules/b/modules/c");
        let d = module("modules/a/modules/d");
        assert_eq!(relationship(&c, &d), Relationship::Uncle);
    }

    #[test]
    fn top_level_elements_are_unrelated() {
        assert_eq!(relationship(&module("modules/a"), &module("modules/x")), Relationship::None);
    }

    #[test]
    fn unknown_is_unrelated() {
        let unknown = ElementInfo::unknown("scripts/a.js");
        assert_eq!(relationship(&module("modules/a"), &unknown), Relationship::None);
        assert_eq!(relationship(&unknown, &unknown), Relationship::None);
    }

    #[test]
    fn inverse_pairs() {
        for r in Relationship::ALL {
            if r != Relationship::Uncle {
                assert_eq!(r.inverse().inverse(), r);
            }
        }
        assert_eq!(Relationship::Sibling.to_string(), "sibling");
    }
}
