//! `element-types`: which element types may depend on which.

use crate::dependency::DependencyDescription;
use crate::matcher::PathMatcher;
use crate::relationship::Relationship;
use crate::rules::message::{render, rule_suffix, type_label};
use crate::rules::{
    BoundaryRule, DefaultPolicy, RuleContext, RuleEntry, RuleMatcher, RuleVerdict, SelectorTargets,
};
use crate::selector::Selector;
use crate::types::{Severity, Violation};

const NAME: &str = "element-types";
const CODE: &str = "BND001";

/// Ordered rules over `from` element types and allowed target types.
#[derive(Debug, Clone)]
pub struct ElementTypesRule {
    default: DefaultPolicy,
    rules: Vec<RuleEntry<Selector>>,
    message: Option<String>,
    severity: Severity,
}

impl ElementTypesRule {
    /// Creates the family.
    #[must_use]
    pub fn new(default: DefaultPolicy, rules: Vec<RuleEntry<Selector>>) -> Self {
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
    pub fn rules(&self) -> &[RuleEntry<Selector>] {
        &self.rules
    }

    /// Evaluates a dependency; `None` when the family does not apply.
    ///
    /// Only dependencies between two different known local elements are
    /// judged.
    #[must_use]
    pub fn evaluate(
        &self,
        matcher: &PathMatcher,
        dependency: &DependencyDescription,
    ) -> Option<RuleVerdict> {
        if !dependency.from.is_known()
            || !dependency.to.is_local_element()
            || dependency.relationship == Relationship::Internal
        {
            return None;
        }
        Some(RuleMatcher::new(matcher).evaluate(
            &SelectorTargets::new(matcher),
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
            "Usage of elements of type {} is not allowed in elements of type {}{}",
            type_label(&dependency.to.element),
            type_label(&dependency.from),
            rule_suffix(verdict)
        )
    }
}

impl BoundaryRule for ElementTypesRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Restrict which element types may import which"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{element, local, matcher};
    use crate::types::Location;

    fn family() -> ElementTypesRule {
        let rules = vec![
            RuleEntry::new(
                "rules[0]",
                "from",
                vec![Selector::of_type("components")],
                vec![
                    Selector::of_type("helpers"),
                    Selector::of_type("components")
                        .capture("family", vec!["${from.family}".into()]),
                ],
                vec![],
            )
            .unwrap(),
            RuleEntry::new(
                "rules[1]",
                "from",
                vec![Selector::of_type("helpers")],
                vec![],
                vec![Selector::of_type("components")],
            )
            .unwrap()
            .with_message(Some("${file.type} must not import ${dependency.type}".into())),
        ];
        ElementTypesRule::new(DefaultPolicy::Disallow, rules)
    }

    #[test]
    fn same_family_components_allowed() {
        let m = matcher();
        let d = local(
            element("components", "components/atoms/a", &[("family", "atoms")]),
            element("components", "components/atoms/b", &[("family", "atoms")]),
        );
        assert!(family().evaluate(&m, &d).unwrap().allowed);

        let d = local(
            element("components", "components/atoms/a", &[("family", "atoms")]),
            element("components", "components/molecules/b", &[("family", "molecules")]),
        );
        assert!(!family().evaluate(&m, &d).unwrap().allowed);
    }

    #[test]
    fn internal_dependencies_are_out_of_scope() {
        let mut d = local(
            element("helpers", "helpers/a", &[]),
            element("helpers", "helpers/a", &[]),
        );
        d.relationship = Relationship::Internal;
        assert!(family().evaluate(&matcher(), &d).is_none());
    }

    #[test]
    fn unknown_target_is_out_of_scope() {
        let d = local(
            element("helpers", "helpers/a", &[]),
            crate::elements::ElementInfo::unknown("scripts/x.js"),
        );
        assert!(family().evaluate(&matcher(), &d).is_none());
    }

    #[test]
    fn violation_uses_rule_message() {
        let m = matcher();
        let location = Location::new("helpers/a/index.js", 1, 1);
        let ctx = RuleContext {
            matcher: &m,
            location: &location,
        };
        let d = local(
            element("helpers", "helpers/a", &[]),
            element("components", "components/b", &[]),
        );
        let v = family().check(&ctx, &d).unwrap();
        assert_eq!(v.code, "BND001");
        assert_eq!(v.message, "helpers must not import components");
        assert_eq!(v.rule_index, Some(1));
        assert_eq!(v.dependency.as_deref(), Some("./dep"));
    }

    #[test]
    fn default_message_names_types() {
        let m = matcher();
        let location = Location::file("modules/a/index.js");
        let ctx = RuleContext {
            matcher: &m,
            location: &location,
        };
        let d = local(
            element("modules", "modules/a", &[]),
            element("helpers", "helpers/b", &[]),
        );
        let v = family().check(&ctx, &d).unwrap();
        assert!(v.message.contains("'helpers'"));
        assert!(v.message.contains("'modules'"));
        assert!(v.message.ends_with("No rule allows it"));
    }
}
