//! `entry-point`: which files of an element may be imported from outside.

use crate::dependency::DependencyDescription;
use crate::elements::ElementInfo;
use crate::matcher::PathMatcher;
use crate::relationship::Relationship;
use crate::rules::message::{render, rule_suffix, type_label};
use crate::rules::{
    BoundaryRule, DefaultPolicy, RuleContext, RuleEntry, RuleMatcher, RuleVerdict, TargetMatcher,
};
use crate::selector::TemplateData;
use crate::types::{Severity, Violation};

const NAME: &str = "entry-point";
const CODE: &str = "BND002";

/// Matches internal-path patterns against the imported file.
struct InternalPathTargets<'a> {
    matcher: &'a PathMatcher,
}

impl TargetMatcher<String> for InternalPathTargets<'_> {
    fn subject<'d>(&self, dependency: &'d DependencyDescription) -> &'d ElementInfo {
        &dependency.to.element
    }

    fn matches_allow(
        &self,
        entry: &String,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        let Some(internal_path) = dependency.to.element.internal_path.as_deref() else {
            return false;
        };
        self.matcher.is_match(internal_path, &[data.render_glob(entry)])
    }
}

/// Ordered rules over `target` element types and allowed internal paths.
#[derive(Debug, Clone)]
pub struct EntryPointRule {
    default: DefaultPolicy,
    rules: Vec<RuleEntry<String>>,
    message: Option<String>,
    severity: Severity,
}

impl EntryPointRule {
    /// Creates the family.
    #[must_use]
    pub fn new(default: DefaultPolicy, rules: Vec<RuleEntry<String>>) -> Self {
        Self {
            default,
            rules,
            message: None,
            severity: Severity::Error,
        }
    }

    /// Sets the family-wide message template.
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

    /// The configured rules.
    #[must_use]
    pub fn rules(&self) -> &[RuleEntry<String>] {
        &self.rules
    }

    /// Evaluates a dependency; `None` when the family does not apply.
    ///
    /// Imports inside one element are never judged.
    #[must_use]
    pub fn evaluate(
        &self,
        matcher: &PathMatcher,
        dependency: &DependencyDescription,
    ) -> Option<RuleVerdict> {
        if !dependency.to.is_local_element() || dependency.relationship == Relationship::Internal {
            return None;
        }
        Some(RuleMatcher::new(matcher).evaluate(
            &InternalPathTargets { matcher },
            dependency,
            &self.rules,
            self.default,
        ))
    }

    fn message(&self, verdict: &RuleVerdict, dependency: &DependencyDescription) -> String {
        let custom = verdict
            .governing_rule
            .and_then(|i| self.rules[i].message.as_deref())
            .or(self.message.as_deref());
        if let Some(template) = custom {
            return render(template, dependency);
        }
        format!(
            "The entry point '{}' is not allowed in elements of type {}{}",
            dependency.to.element.internal_path.as_deref().unwrap_or_default(),
            type_label(&dependency.to.element),
            rule_suffix(verdict)
        )
    }
}

impl BoundaryRule for EntryPointRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Restrict which files of an element may be imported"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(
        &self,
        ctx: &RuleContext<'_>,
        dependency: &DependencyDescription,
    ) -> Option<Violation> {
        let verdict = self.evaluate(ctx.matcher, dependency)?;
        if verdict.allowed {
            return None;
        }
        Some(
            Violation::new(
                CODE,
                NAME,
                self.severity,
                ctx.location.clone(),
                self.message(&verdict, dependency),
            )
            .with_dependency(&dependency.to.source)
            .with_rule_index(verdict.governing_rule),
        )
    }
}
