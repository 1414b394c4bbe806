//! `no-private`: elements nested in another element are private to it.
//!
//! A private element (one with a parent) may be imported from inside itself,
//! by its parent and by its siblings. Optionally its uncles may import it
//! too. Everyone else is denied: the grandparent reaching two levels down,
//! and elements nested inside the target reaching back up to it.

use crate::dependency::DependencyDescription;
use crate::relationship::Relationship;
use crate::rules::message::render;
use crate::rules::{BoundaryRule, RuleContext};
use crate::types::{Severity, Violation};

const NAME: &str = "no-private";
const CODE: &str = "BND004";

/// Denies imports of elements private to another element.
#[derive(Debug, Clone)]
pub struct NoPrivateRule {
    allow_uncles: bool,
    message: Option<String>,
    severity: Severity,
}

impl Default for NoPrivateRule {
    fn default() -> Self {
        Self {
            allow_uncles: true,
            message: None,
            severity: Severity::Error,
        }
    }
}

impl NoPrivateRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(allow_uncles: bool) -> Self {
        Self {
            allow_uncles,
            ..Self::default()
        }
    }

    /// Sets the message template.
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Sets the violation severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Returns `Some(allowed)` for imports of private elements, `None`
    /// when the target is not private.
    #[must_use]
    pub fn evaluate(&self, dependency: &DependencyDescription) -> Option<bool> {
        if !dependency.to.is_local_element() || dependency.to.element.parents.is_empty() {
            return None;
        }
        Some(match dependency.relationship {
            Relationship::Internal | Relationship::Child | Relationship::Sibling => true,
            Relationship::Uncle => self.allow_uncles,
            Relationship::Descendant
            | Relationship::Parent
            | Relationship::Ancestor
            | Relationship::None => false,
        })
    }
}

impl BoundaryRule for NoPrivateRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Deny imports of elements private to another element"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(
        &self,
        ctx: &RuleContext<'_>,
        dependency: &DependencyDescription,
    ) -> Option<Violation> {
        if self.evaluate(dependency)? {
            return None;
        }
        let message = match &self.message {
            Some(template) => render(template, dependency),
            None => format!(
                "Dependency is private of element of type '{}'",
                dependency
                    .to
                    .element
                    .nearest_parent()
                    .map_or("unknown", |p| p.element_type.as_str())
            ),
        };
        Some(
            Violation::new(CODE, NAME, self.severity, ctx.location.clone(), message)
                .with_dependency(&dependency.to.source),
        )
    }
}
