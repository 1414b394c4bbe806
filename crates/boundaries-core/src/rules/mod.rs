//! Boundary rule families and the ordered allow/disallow rule matcher.
//!
//! Every family with a rule list (element-types, entry-point, external)
//! evaluates a dependency the same way:
//!
//! 1. Scan the rules in order and stop at the first one whose subject
//!    selector (and `import-kind`, if set) matches. Later rules are never
//!    consulted.
//! 2. A `disallow` hit denies; otherwise an `allow` hit permits and an
//!    `allow` miss denies. A rule with only `disallow` permits by omission.
//! 3. Without a governing rule the family's default policy applies.

pub mod element_types;
pub mod entry_point;
pub mod external;
pub mod message;
pub mod no_private;
pub mod presence;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dependency::DependencyDescription;
use crate::elements::ElementInfo;
use crate::error::ModelError;
use crate::matcher::PathMatcher;
use crate::selector::{Selector, TemplateData};
use crate::types::{Location, Severity, Violation};

pub use element_types::ElementTypesRule;
pub use entry_point::EntryPointRule;
pub use external::{ExternalRule, ExternalSelector};
pub use no_private::NoPrivateRule;
pub use presence::{NoIgnoredRule, NoUnknownFilesRule, NoUnknownRule};

// ────────────────────────────────────────────
// Rule traits
// ────────────────────────────────────────────

/// Shared state handed to rules while checking one dependency.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The engine's glob matcher.
    pub matcher: &'a PathMatcher,
    /// Where the import appears.
    pub location: &'a Location,
}

/// A rule judging individual dependency edges.
pub trait BoundaryRule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "element-types").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "BND001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the severity of violations from this rule.
    fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks one dependency; `None` when it is permitted or out of scope.
    fn check(&self, ctx: &RuleContext<'_>, dependency: &DependencyDescription) -> Option<Violation>;
}

/// Type alias for boxed [`BoundaryRule`] trait objects.
pub type RuleBox = Box<dyn BoundaryRule>;

/// A rule judging analyzed files on their own.
pub trait FileRule: Send + Sync {
    /// Returns the kebab-case name of this rule.
    fn name(&self) -> &'static str;

    /// Returns the rule code.
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the severity of violations from this rule.
    fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks one classified file.
    fn check_file(&self, element: &ElementInfo, location: &Location) -> Option<Violation>;
}

/// Type alias for boxed [`FileRule`] trait objects.
pub type FileRuleBox = Box<dyn FileRule>;

// ────────────────────────────────────────────
// Rule entries and verdicts
// ────────────────────────────────────────────

/// What happens when no rule governs a dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    /// Permit.
    Allow,
    /// Deny.
    #[default]
    Disallow,
}

impl DefaultPolicy {
    /// True for [`DefaultPolicy::Allow`].
    #[must_use]
    pub fn allows(self) -> bool {
        self == Self::Allow
    }
}

impl fmt::Display for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Disallow => write!(f, "disallow"),
        }
    }
}

impl FromStr for DefaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "disallow" => Ok(Self::Disallow),
            other => Err(other.to_string()),
        }
    }
}

/// One ordered rule of a family.
///
/// `T` is what `allow`/`disallow` list: element selectors, internal-path
/// patterns or external module selectors depending on the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEntry<T> {
    /// Selectors for the element the rule is about (`from` or `target`).
    pub subject: Vec<Selector>,
    /// Permitted targets.
    pub allow: Vec<T>,
    /// Denied targets.
    pub disallow: Vec<T>,
    /// Pattern over `value` / `type`; the rule applies to every kind if unset.
    pub import_kind: Option<String>,
    /// Custom message template for violations governed by this rule.
    pub message: Option<String>,
}

impl<T> RuleEntry<T> {
    /// Creates a rule for `subject`.
    ///
    /// # Errors
    ///
    /// Returns error if the subject is empty or neither list has entries.
    pub fn new(
        context: impl Into<String>,
        subject_field: &'static str,
        subject: Vec<Selector>,
        allow: Vec<T>,
        disallow: Vec<T>,
    ) -> Result<Self, ModelError> {
        let context = context.into();
        if subject.is_empty() {
            return Err(ModelError::MissingSubject {
                context,
                field: subject_field,
            });
        }
        if allow.is_empty() && disallow.is_empty() {
            return Err(ModelError::EmptyRule { context });
        }
        Ok(Self {
            subject,
            allow,
            disallow,
            import_kind: None,
            message: None,
        })
    }

    /// Restricts the rule to one import kind pattern.
    #[must_use]
    pub fn with_import_kind(mut self, import_kind: Option<String>) -> Self {
        self.import_kind = import_kind;
        self
    }

    /// Sets the custom message template.
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}

/// How a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// No rule governed; the default policy decided.
    Default,
    /// A `disallow` entry matched.
    Disallowed,
    /// An `allow` entry matched.
    Allowed,
    /// The governing rule has `allow` entries and none matched.
    NotAllowed,
    /// The governing rule has only `disallow` entries and none matched.
    NotDisallowed,
}

/// Result of evaluating one dependency against a rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    /// Whether the dependency is permitted.
    pub allowed: bool,
    /// 0-based index of the governing rule.
    pub governing_rule: Option<usize>,
    /// True when the default policy decided.
    pub is_default: bool,
    /// Index of the matching entry in the deciding `allow`/`disallow` list.
    pub matched_selector: Option<usize>,
    /// How the verdict was reached.
    pub decision: Decision,
}

impl RuleVerdict {
    fn by_default(policy: DefaultPolicy) -> Self {
        Self {
            allowed: policy.allows(),
            governing_rule: None,
            is_default: true,
            matched_selector: None,
            decision: Decision::Default,
        }
    }

    fn governed(rule: usize, decision: Decision, matched_selector: Option<usize>) -> Self {
        Self {
            allowed: matches!(decision, Decision::Allowed | Decision::NotDisallowed),
            governing_rule: Some(rule),
            is_default: false,
            matched_selector,
            decision,
        }
    }
}

// ────────────────────────────────────────────
// Matching
// ────────────────────────────────────────────

/// Family-specific part of rule matching: which element is the subject and
/// how an `allow`/`disallow` entry matches the dependency.
pub trait TargetMatcher<T> {
    /// The element subject selectors are matched against.
    fn subject<'d>(&self, dependency: &'d DependencyDescription) -> &'d ElementInfo;

    /// Whether an `allow` entry matches.
    fn matches_allow(
        &self,
        entry: &T,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool;

    /// Whether a `disallow` entry matches.
    fn matches_disallow(
        &self,
        entry: &T,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        self.matches_allow(entry, dependency, data)
    }
}

/// Evaluation state.
#[derive(Debug)]
enum Step {
    MatchSubject(usize),
    CheckDisallow(usize),
    CheckAllow(usize),
    Done(RuleVerdict),
}

/// Evaluates ordered rule lists.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher<'a> {
    matcher: &'a PathMatcher,
}

impl<'a> RuleMatcher<'a> {
    /// Creates a rule matcher over the engine's glob matcher.
    #[must_use]
    pub fn new(matcher: &'a PathMatcher) -> Self {
        Self { matcher }
    }

    /// Evaluates `dependency` against `rules`; first applying rule governs.
    #[must_use]
    pub fn evaluate<T, M: TargetMatcher<T>>(
        &self,
        targets: &M,
        dependency: &DependencyDescription,
        rules: &[RuleEntry<T>],
        default: DefaultPolicy,
    ) -> RuleVerdict {
        let data = TemplateData::new(&dependency.from, Some(&dependency.to.element));
        let subject = targets.subject(dependency);
        let mut step = Step::MatchSubject(0);

        loop {
            step = match step {
                Step::MatchSubject(index) => match rules.get(index) {
                    None => Step::Done(RuleVerdict::by_default(default)),
                    Some(rule) if self.applies(rule, subject, dependency, &data) => {
                        Step::CheckDisallow(index)
                    }
                    Some(_) => Step::MatchSubject(index + 1),
                },
                Step::CheckDisallow(index) => {
                    let hit = rules[index]
                        .disallow
                        .iter()
                        .position(|entry| targets.matches_disallow(entry, dependency, &data));
                    match hit {
                        Some(entry) => Step::Done(RuleVerdict::governed(
                            index,
                            Decision::Disallowed,
                            Some(entry),
                        )),
                        None => Step::CheckAllow(index),
                    }
                }
                Step::CheckAllow(index) => {
                    let rule = &rules[index];
                    if rule.allow.is_empty() {
                        Step::Done(RuleVerdict::governed(index, Decision::NotDisallowed, None))
                    } else {
                        let hit = rule
                            .allow
                            .iter()
                            .position(|entry| targets.matches_allow(entry, dependency, &data));
                        Step::Done(match hit {
                            Some(entry) => {
                                RuleVerdict::governed(index, Decision::Allowed, Some(entry))
                            }
                            None => RuleVerdict::governed(index, Decision::NotAllowed, None),
                        })
                    }
                }
                Step::Done(verdict) => {
                    tracing::debug!(
                        allowed = verdict.allowed,
                        rule = ?verdict.governing_rule,
                        decision = ?verdict.decision,
                        "rule verdict"
                    );
                    return verdict;
                }
            };
        }
    }

    fn applies<T>(
        &self,
        rule: &RuleEntry<T>,
        subject: &ElementInfo,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        if let Some(kind) = &rule.import_kind {
            if !self
                .matcher
                .is_match(dependency.import_kind.as_str(), std::slice::from_ref(kind))
            {
                return false;
            }
        }
        rule.subject
            .iter()
            .any(|selector| selector.matches(subject, data, self.matcher))
    }
}

/// Element-selector matching shared by families whose entries are selectors.
#[derive(Debug, Clone, Copy)]
pub struct SelectorTargets<'a> {
    matcher: &'a PathMatcher,
}

impl<'a> SelectorTargets<'a> {
    /// Matches selector entries against the dependency target.
    #[must_use]
    pub fn new(matcher: &'a PathMatcher) -> Self {
        Self { matcher }
    }
}

impl TargetMatcher<Selector> for SelectorTargets<'_> {
    fn subject<'d>(&self, dependency: &'d DependencyDescription) -> &'d ElementInfo {
        &dependency.from
    }

    fn matches_allow(
        &self,
        entry: &Selector,
        dependency: &DependencyDescription,
        data: &TemplateData<'_>,
    ) -> bool {
        entry.matches(&dependency.to.element, data, self.matcher)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::cache::CacheLayer;
    use crate::dependency::{DependencyDescription, ImportKind, TargetInfo};
    use crate::elements::{CapturedValues, ElementInfo};
    use crate::matcher::PathMatcher;
    use crate::origin::{Origin, OriginInfo};
    use crate::relationship::Relationship;

    pub(crate) fn matcher() -> PathMatcher {
        PathMatcher::new(Arc::new(CacheLayer::new("test")))
    }

    pub(crate) fn element(
        element_type: &str,
        element_path: &str,
        captures: &[(&str, &str)],
    ) -> ElementInfo {
        ElementInfo {
            path: format!("{element_path}/index.js"),
            element_type: Some(element_type.into()),
            element_path: Some(element_path.into()),
            internal_path: Some("index.js".into()),
            captured_values: captures
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<CapturedValues>(),
            parents: vec![],
            is_ignored: false,
        }
    }

    pub(crate) fn local(from: ElementInfo, to: ElementInfo) -> DependencyDescription {
        DependencyDescription {
            from,
            to: TargetInfo {
                origin: OriginInfo {
                    origin: Origin::Local,
                    is_ignored: false,
                    base_module: None,
                    sub_path: None,
                    resolved_path: Some(to.path.clone()),
                },
                element: to,
                source: "./dep".into(),
            },
            relationship: Relationship::None,
            import_kind: ImportKind::Value,
            specifiers: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{element, local, matcher};
    use super::*;
    use crate::dependency::ImportKind;

    fn rule(from: &str, allow: &[&str], disallow: &[&str]) -> RuleEntry<Selector> {
        RuleEntry::new(
            "test",
            "from",
            vec![Selector::of_type(from)],
            allow.iter().map(|t| Selector::of_type(*t)).collect(),
            disallow.iter().map(|t| Selector::of_type(*t)).collect(),
        )
        .unwrap()
    }

    fn evaluate(
        rules: &[RuleEntry<Selector>],
        default: DefaultPolicy,
        from: &str,
        to: &str,
    ) -> RuleVerdict {
        let m = matcher();
        let dependency = local(element(from, from, &[]), element(to, to, &[]));
        RuleMatcher::new(&m).evaluate(&SelectorTargets::new(&m), &dependency, rules, default)
    }

    #[test]
    fn default_policy_when_nothing_governs() {
        let verdict = evaluate(&[], DefaultPolicy::Disallow, "components", "helpers");
        assert!(!verdict.allowed);
        assert!(verdict.is_default);
        assert_eq!(verdict.governing_rule, None);
        assert_eq!(verdict.decision, Decision::Default);

        assert!(evaluate(&[], DefaultPolicy::Allow, "components", "helpers").allowed);
    }

    #[test]
    fn first_matching_rule_governs() {
        let rules = [
            rule("components", &["helpers"], &[]),
            rule("components", &[], &["helpers"]),
        ];
        let verdict = evaluate(&rules, DefaultPolicy::Disallow, "components", "helpers");
        assert!(verdict.allowed);
        assert_eq!(verdict.governing_rule, Some(0));
        assert_eq!(verdict.matched_selector, Some(0));
    }

    #[test]
    fn allow_miss_denies_even_if_later_rule_allows() {
        let rules = [
            rule("components", &["modules"], &[]),
            rule("components", &["helpers"], &[]),
        ];
        let verdict = evaluate(&rules, DefaultPolicy::Allow, "components", "helpers");
        assert!(!verdict.allowed);
        assert_eq!(verdict.governing_rule, Some(0));
        assert_eq!(verdict.decision, Decision::NotAllowed);
    }

    #[test]
    fn disallow_checked_before_allow() {
        let rules = [rule("components", &["*"], &["helpers"])];
        let verdict = evaluate(&rules, DefaultPolicy::Allow, "components", "helpers");
        assert!(!verdict.allowed);
        assert_eq!(verdict.decision, Decision::Disallowed);

        let verdict = evaluate(&rules, DefaultPolicy::Disallow, "components", "modules");
        assert!(verdict.allowed);
        assert_eq!(verdict.decision, Decision::Allowed);
    }

    #[test]
    fn disallow_only_rule_allows_by_omission() {
        let rules = [rule("components", &[], &["modules"])];
        let verdict = evaluate(&rules, DefaultPolicy::Disallow, "components", "helpers");
        assert!(verdict.allowed);
        assert!(!verdict.is_default);
        assert_eq!(verdict.decision, Decision::NotDisallowed);
    }

    #[test]
    fn non_matching_subject_is_skipped() {
        let rules = [rule("helpers", &[], &["*"]), rule("components", &["helpers"], &[])];
        let verdict = evaluate(&rules, DefaultPolicy::Disallow, "components", "helpers");
        assert_eq!(verdict.governing_rule, Some(1));
    }

    #[test]
    fn import_kind_filters_rules() {
        let m = matcher();
        let rules = [rule("components", &["helpers"], &[]).with_import_kind(Some("type".into()))];
        let mut dependency = local(element("components", "c", &[]), element("helpers", "h", &[]));

        let verdict = RuleMatcher::new(&m).evaluate(
            &SelectorTargets::new(&m),
            &dependency,
            &rules,
            DefaultPolicy::Disallow,
        );
        assert!(verdict.is_default);

        dependency.import_kind = ImportKind::Type;
        let verdict = RuleMatcher::new(&m).evaluate(
            &SelectorTargets::new(&m),
            &dependency,
            &rules,
            DefaultPolicy::Disallow,
        );
        assert!(verdict.allowed);
    }

    #[test]
    fn rule_entry_validation() {
        assert!(matches!(
            RuleEntry::<Selector>::new(
                "rules[0]",
                "from",
                vec![],
                vec![Selector::of_type("a")],
                vec![]
            ),
            Err(ModelError::MissingSubject { field: "from", .. })
        ));
        assert!(matches!(
            RuleEntry::<Selector>::new(
                "rules[0]",
                "from",
                vec![Selector::of_type("a")],
                vec![],
                vec![]
            ),
            Err(ModelError::EmptyRule { .. })
        ));
    }

    #[test]
    fn default_policy_parses() {
        assert_eq!("allow".parse::<DefaultPolicy>(), Ok(DefaultPolicy::Allow));
        assert!("deny".parse::<DefaultPolicy>().is_err());
    }
}
