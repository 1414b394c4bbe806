//! Rules about dependencies and files outside the element catalog:
//! `no-unknown`, `no-ignored` and `no-unknown-files`.

use crate::dependency::DependencyDescription;
use crate::elements::ElementInfo;
use crate::rules::message::{render, render_file};
use crate::rules::{BoundaryRule, FileRule, RuleContext};
use crate::types::{Location, Severity, Violation};

/// Denies imports of local files that belong to no element.
#[derive(Debug, Clone)]
pub struct NoUnknownRule {
    message: Option<String>,
    severity: Severity,
}

/// Denies imports of files excluded by include/ignore settings.
#[derive(Debug, Clone)]
pub struct NoIgnoredRule {
    message: Option<String>,
    severity: Severity,
}

/// Reports analyzed files that belong to no element.
#[derive(Debug, Clone)]
pub struct NoUnknownFilesRule {
    message: Option<String>,
    severity: Severity,
}

macro_rules! presence_rule_ctor {
    ($rule:ident) => {
        impl Default for $rule {
            fn default() -> Self {
                Self {
                    message: None,
                    severity: Severity::Error,
                }
            }
        }

        impl $rule {
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
        }
    };
}

presence_rule_ctor!(NoUnknownRule);
presence_rule_ctor!(NoIgnoredRule);
presence_rule_ctor!(NoUnknownFilesRule);

impl NoUnknownRule {
    /// True when the import is a local file of no known element.
    #[must_use]
    pub fn is_violation(dependency: &DependencyDescription) -> bool {
        let to = &dependency.to;
        to.origin.is_local() && !to.is_ignored() && !to.element.is_known()
    }
}

impl BoundaryRule for NoUnknownRule {
    fn name(&self) -> &'static str {
        "no-unknown"
    }

    fn code(&self) -> &'static str {
        "BND005"
    }

    fn description(&self) -> &'static str {
        "Deny imports of local files that belong to no element"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(
        &self,
        ctx: &RuleContext<'_>,
        dependency: &DependencyDescription,
    ) -> Option<Violation> {
        if !Self::is_violation(dependency) {
            return None;
        }
        let message = self.message.as_deref().map_or_else(
            || "Importing unknown elements is not allowed".to_string(),
            |t| render(t, dependency),
        );
        Some(
            Violation::new(self.code(), self.name(), self.severity, ctx.location.clone(), message)
                .with_dependency(&dependency.to.source),
        )
    }
}

impl NoIgnoredRule {
    /// True when the import targets an ignored local file.
    #[must_use]
    pub fn is_violation(dependency: &DependencyDescription) -> bool {
        dependency.to.origin.is_local() && dependency.to.is_ignored()
    }
}

impl BoundaryRule for NoIgnoredRule {
    fn name(&self) -> &'static str {
        "no-ignored"
    }

    fn code(&self) -> &'static str {
        "BND006"
    }

    fn description(&self) -> &'static str {
        "Deny imports of ignored files"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(
        &self,
        ctx: &RuleContext<'_>,
        dependency: &DependencyDescription,
    ) -> Option<Violation> {
        if !Self::is_violation(dependency) {
            return None;
        }
        let message = self.message.as_deref().map_or_else(
            || "Importing ignored files is not allowed".to_string(),
            |t| render(t, dependency),
        );
        Some(
            Violation::new(self.code(), self.name(), self.severity, ctx.location.clone(), message)
                .with_dependency(&dependency.to.source),
        )
    }
}

impl FileRule for NoUnknownFilesRule {
    fn name(&self) -> &'static str {
        "no-unknown-files"
    }

    fn code(&self) -> &'static str {
        "BND007"
    }

    fn description(&self) -> &'static str {
        "Deny files that belong to no element"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check_file(&self, element: &ElementInfo, location: &Location) -> Option<Violation> {
        if element.is_known() || element.is_ignored {
            return None;
        }
        let message = self.message.as_deref().map_or_else(
            || "File does not belong to any element".to_string(),
            |t| render_file(t, element),
        );
        Some(Violation::new(
            self.code(),
            self.name(),
            self.severity,
            location.clone(),
            message,
        ))
    }
}
