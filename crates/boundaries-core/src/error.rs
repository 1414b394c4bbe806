//! Validation errors of the domain model.

use crate::matcher::PatternError;

/// Errors in domain model construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Element type name is empty.
    #[error("element type must not be empty")]
    EmptyElementType,

    /// An element descriptor declares no pattern.
    #[error("element `{element_type}` declares no pattern")]
    NoPatterns {
        /// The element type.
        element_type: String,
    },

    /// A glob pattern failed to compile.
    #[error("{context}: {source}")]
    InvalidPattern {
        /// Where the pattern was found.
        context: String,
        /// Why it failed.
        source: PatternError,
    },

    /// The same capture name is declared twice for one element.
    #[error("element `{element_type}`: capture name `{name}` declared twice")]
    DuplicateCaptureName {
        /// The element type.
        element_type: String,
        /// The repeated name.
        name: String,
    },

    /// A selector names an element type that no descriptor declares.
    #[error("{context}: unknown element type `{name}`")]
    UnknownElementType {
        /// Where the reference was found.
        context: String,
        /// The undefined type.
        name: String,
    },

    /// A rule declares neither `allow` nor `disallow`.
    #[error("{context}: rule must declare `allow` or `disallow`")]
    EmptyRule {
        /// Which rule.
        context: String,
    },

    /// A rule declares no subject selector.
    #[error("{context}: rule must declare at least one selector in `{field}`")]
    MissingSubject {
        /// Which rule.
        context: String,
        /// The expected field (`from` or `target`).
        field: &'static str,
    },
}
