//! `external`: which packages and built-ins each element type may import.

use serde::Serialize;

use crate::dependency::DependencyDescription;
use crate::elements::ElementInfo;
use crate::matcher::PathMatcher;
use crate::rules::message::{render, rule_suffix, type_label};
use crate::rules::{
    BoundaryRule, DefaultPolicy, RuleContext, RuleEntry, RuleMatcher, RuleVerdict, TargetMatcher,
};
use crate::selector::TemplateData;
use crate::types::{Severity, Violation};

const NAME: &str = "external";
const CODE: &str = "BND003";

/// A package, optionally narrowed to imported names or sub paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalSelector {
    /// Glob over the base module name (e.g. `react`, `@scope/*`).
    pub module: String,
    /// Globs over imported names.
    pub specifiers: Vec<String>,
    /// Globs over the sub path after the module name.
    pub path: Vec<String>,
}

impl ExternalSelector {
    /// Selector for a whole module.
    #[must_use]
    pub fn module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            specifiers: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Narrows the selector to imported names.
    #[must_use]
    pub fn with_specifiers(mut self, specifiers: Vec<String>) -> Self {
        self.specifiers = specifiers;
        self
    }

    /// Narrows the selector to sub paths.
    #[must_use]
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }
}

/// Matches module selectors against the imported package.
struct ModuleTargets<'a> {
    matcher: &'a PathMatcher,
}

impl ModuleTargets<'_> {
    fn render_all(patterns: &[String], data: &TemplateData<'_>) -> Vec<String> {
        patterns.iter().map(|p| data.render_glob(p)).collect()
    }

    /// Module and sub path constraints, shared by allow and disallow.
    fn matches_module(
        &self,
        entry: &ExternalSelector,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        let Some(base_module) = dependency.to.origin.base_module.as_deref() else {
            return false;
        };
        if !self.matcher.is_match(base_module, &[data.render_glob(&entry.module)]) {
            return false;
        }
        if entry.path.is_empty() {
            return true;
        }
        dependency
            .to
            .origin
            .sub_path
            .as_deref()
            .is_some_and(|sub| self.matcher.is_match(sub, &Self::render_all(&entry.path, data)))
    }
}

impl TargetMatcher<ExternalSelector> for ModuleTargets<'_> {
    fn subject<'d>(&self, dependency: &'d DependencyDescription) -> &'d ElementInfo {
        &dependency.from
    }

    /// Allowed when every imported name is permitted.
    fn matches_allow(
        &self,
        entry: &ExternalSelector,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        if !self.matches_module(entry, dependency, data) {
            return false;
        }
        if entry.specifiers.is_empty() {
            return true;
        }
        let patterns = Self::render_all(&entry.specifiers, data);
        !dependency.specifiers.is_empty()
            && dependency
                .specifiers
                .iter()
                .all(|s| self.matcher.is_match(s, &patterns))
    }

    /// Denied when any imported name is forbidden.
    fn matches_disallow(
        &self,
        entry: &ExternalSelector,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        if !self.matches_module(entry, dependency, data) {
            return false;
        }
        if entry.specifiers.is_empty() {
            return true;
        }
        let patterns = Self::render_all(&entry.specifiers, data);
        dependency
            .specifiers
            .iter()
            .any(|s| self.matcher.is_match(s, &patterns))
    }
}

/// Ordered rules over `from` element types and allowed packages.
#[derive(Debug, Clone)]
pub struct ExternalRule {
    default: DefaultPolicy,
    rules: Vec<RuleEntry<ExternalSelector>>,
    message: Option<String>,
    severity: Severity,
}

impl ExternalRule {
    /// Creates the family.
    #[must_use]
    pub fn new(default: DefaultPolicy, rules: Vec<RuleEntry<ExternalSelector>>) -> Self {
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
    pub fn rules(&self) -> &[RuleEntry<ExternalSelector>] {
        &self.rules
    }

    /// Evaluates a dependency; `None` unless it imports a package or
    /// built-in from a known element.
    #[must_use]
    pub fn evaluate(
        &self,
        matcher: &PathMatcher,
        dependency: &DependencyDescription,
    ) -> Option<RuleVerdict> {
        let origin = &dependency.to.origin;
        if !dependency.from.is_known() || !(origin.is_external() || origin.is_built_in()) {
            return None;
        }
        Some(RuleMatcher::new(matcher).evaluate(
            &ModuleTargets { matcher },
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
            "Usage of external module '{}' is not allowed in elements of type {}{}",
            dependency
                .to
                .origin
                .base_module
                .as_deref()
                .unwrap_or(&dependency.to.source),
            type_label(&dependency.from),
            rule_suffix(verdict)
        )
    }
}

impl BoundaryRule for ExternalRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Restrict which external modules an element type may import"
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
