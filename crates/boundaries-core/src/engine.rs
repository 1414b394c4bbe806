//! The `Boundaries` facade: one engine per configuration.

use std::sync::Arc;

use crate::cache::{CacheError, CacheLayer, CacheSnapshot};
use crate::config::{BoundariesConfig, LoadConfigError, RuleFamilies};
use crate::dependency::{DependencyDescriber, DependencyDescription, DependencyEdge};
use crate::elements::{ElementClassifier, ElementInfo};
use crate::matcher::PathMatcher;
use crate::origin::OriginClassifier;
use crate::rules::{BoundaryRule, FileRule, FileRuleBox, RuleBox, RuleContext, RuleVerdict};
use crate::settings::Settings;
use crate::types::{LintResult, Location, Violation};

/// Classification and rule evaluation for one configuration.
///
/// The engine is `Send + Sync`; a multi-threaded host shares one instance
/// and with it every cache.
///
/// ```
/// use boundaries_core::{Boundaries, DependencyEdge};
///
/// let engine = Boundaries::from_toml(r#"
/// [[elements]]
/// type = "helpers"
/// pattern = "helpers/*"
/// capture = ["name"]
///
/// [[elements]]
/// type = "components"
/// pattern = "components/*"
/// capture = ["name"]
///
/// [element-types]
/// default = "disallow"
///
/// [[element-types.rules]]
/// from = "helpers"
/// allow = "helpers"
/// "#).unwrap();
///
/// let edge = DependencyEdge::new("../../components/button")
///     .resolved("components/button/index.js");
/// let violations = engine.check_dependency("helpers/date/index.js", &edge, 1, 1);
/// assert_eq!(violations[0].code, "BND001");
/// ```
pub struct Boundaries {
    settings: Arc<Settings>,
    cache: Arc<CacheLayer>,
    matcher: Arc<PathMatcher>,
    elements: Arc<ElementClassifier>,
    describer: DependencyDescriber,
    families: RuleFamilies,
    extra_rules: Vec<RuleBox>,
    extra_file_rules: Vec<FileRuleBox>,
}

impl std::fmt::Debug for Boundaries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boundaries")
            .field("fingerprint", &self.cache.fingerprint())
            .field("elements", &self.settings.elements().len())
            .field("rules", &self.rule_count())
            .finish_non_exhaustive()
    }
}

impl Boundaries {
    /// Creates an engine for a validated configuration.
    #[must_use]
    pub fn new(config: BoundariesConfig) -> Self {
        let (settings, families) = config.into_parts();
        let settings = Arc::new(settings);
        let cache = Arc::new(CacheLayer::new(settings.fingerprint()));
        let matcher = Arc::new(PathMatcher::new(Arc::clone(&cache)));
        let elements = Arc::new(ElementClassifier::new(
            Arc::clone(&settings),
            Arc::clone(&matcher),
            Arc::clone(&cache),
        ));
        let origins = Arc::new(OriginClassifier::new(
            Arc::clone(&settings),
            Arc::clone(&matcher),
            Arc::clone(&cache),
        ));
        let describer = DependencyDescriber::new(Arc::clone(&elements), origins);

        tracing::info!(
            fingerprint = %cache.fingerprint(),
            elements = settings.elements().len(),
            "boundaries engine ready"
        );

        Self {
            settings,
            cache,
            matcher,
            elements,
            describer,
            families,
            extra_rules: Vec::new(),
            extra_file_rules: Vec::new(),
        }
    }

    /// Parses TOML configuration and creates an engine.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is malformed or invalid.
    pub fn from_toml(content: &str) -> Result<Self, LoadConfigError> {
        BoundariesConfig::parse(content).map(Self::new)
    }

    /// Adds a host-defined dependency rule, run after the configured families.
    #[must_use]
    pub fn with_rule<R: BoundaryRule + 'static>(mut self, rule: R) -> Self {
        self.extra_rules.push(Box::new(rule));
        self
    }

    /// Adds a host-defined file rule.
    #[must_use]
    pub fn with_file_rule<R: FileRule + 'static>(mut self, rule: R) -> Self {
        self.extra_file_rules.push(Box::new(rule));
        self
    }

    /// The engine's settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The configured rule families.
    #[must_use]
    pub fn families(&self) -> &RuleFamilies {
        &self.families
    }

    /// Number of active dependency and file rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.boundary_rules().count() + self.file_rules().count()
    }

    /// Active dependency rules, configured families first.
    pub fn boundary_rules(&self) -> impl Iterator<Item = &dyn BoundaryRule> {
        let f = &self.families;
        let configured = [
            f.element_types.as_ref().map(|r| r as &dyn BoundaryRule),
            f.entry_point.as_ref().map(|r| r as &dyn BoundaryRule),
            f.external.as_ref().map(|r| r as &dyn BoundaryRule),
            f.no_private.as_ref().map(|r| r as &dyn BoundaryRule),
            f.no_unknown.as_ref().map(|r| r as &dyn BoundaryRule),
            f.no_ignored.as_ref().map(|r| r as &dyn BoundaryRule),
        ];
        configured
            .into_iter()
            .flatten()
            .chain(self.extra_rules.iter().map(|r| r.as_ref() as &dyn BoundaryRule))
    }

    /// Active file rules, configured families first.
    pub fn file_rules(&self) -> impl Iterator<Item = &dyn FileRule> {
        self.families
            .no_unknown_files
            .as_ref()
            .map(|r| r as &dyn FileRule)
            .into_iter()
            .chain(self.extra_file_rules.iter().map(|r| r.as_ref() as &dyn FileRule))
    }

    // ────────────────────────────────────────────
    // Description
    // ────────────────────────────────────────────

    /// Classifies a project-relative path.
    #[must_use]
    pub fn describe_element(&self, path: &str) -> ElementInfo {
        self.elements.classify(path)
    }

    /// Describes the dependency of the file at `from_path` on `edge`.
    #[must_use]
    pub fn describe_dependency(
        &self,
        from_path: &str,
        edge: &DependencyEdge,
    ) -> DependencyDescription {
        self.describer.describe(from_path, edge)
    }

    // ────────────────────────────────────────────
    // Rule families
    // ────────────────────────────────────────────

    /// `element-types` verdict; `None` when disabled or out of scope.
    #[must_use]
    pub fn evaluate_element_types(
        &self,
        dependency: &DependencyDescription,
    ) -> Option<RuleVerdict> {
        self.families
            .element_types
            .as_ref()?
            .evaluate(&self.matcher, dependency)
    }

    /// `entry-point` verdict; `None` when disabled or out of scope.
    #[must_use]
    pub fn evaluate_entry_point(&self, dependency: &DependencyDescription) -> Option<RuleVerdict> {
        self.families
            .entry_point
            .as_ref()?
            .evaluate(&self.matcher, dependency)
    }

    /// `external` verdict; `None` when disabled or out of scope.
    #[must_use]
    pub fn evaluate_external(&self, dependency: &DependencyDescription) -> Option<RuleVerdict> {
        self.families
            .external
            .as_ref()?
            .evaluate(&self.matcher, dependency)
    }

    /// Whether `no-private` permits the dependency; `None` when disabled or
    /// out of scope.
    #[must_use]
    pub fn evaluate_no_private(&self, dependency: &DependencyDescription) -> Option<bool> {
        self.families.no_private.as_ref()?.evaluate(dependency)
    }

    /// Whether `no-unknown` permits the dependency; `None` when disabled.
    #[must_use]
    pub fn evaluate_no_unknown(&self, dependency: &DependencyDescription) -> Option<bool> {
        self.families.no_unknown.as_ref()?;
        Some(!crate::rules::NoUnknownRule::is_violation(dependency))
    }

    /// Whether `no-ignored` permits the dependency; `None` when disabled.
    #[must_use]
    pub fn evaluate_no_ignored(&self, dependency: &DependencyDescription) -> Option<bool> {
        self.families.no_ignored.as_ref()?;
        Some(!crate::rules::NoIgnoredRule::is_violation(dependency))
    }

    /// Whether `no-unknown-files` permits the file; `None` when disabled.
    #[must_use]
    pub fn evaluate_no_unknown_files(&self, path: &str) -> Option<bool> {
        let rule = self.families.no_unknown_files.as_ref()?;
        let element = self.describe_element(path);
        Some(rule.check_file(&element, &Location::file(path)).is_none())
    }

    // ────────────────────────────────────────────
    // Checking
    // ────────────────────────────────────────────

    /// Runs every dependency rule against one import of `from_path`.
    ///
    /// `line` and `column` locate the import statement in the host's source.
    #[must_use]
    pub fn check_dependency(
        &self,
        from_path: &str,
        edge: &DependencyEdge,
        line: usize,
        column: usize,
    ) -> Vec<Violation> {
        let dependency = self.describe_dependency(from_path, edge);
        let location = Location::new(from_path, line, column);
        let ctx = RuleContext {
            matcher: &self.matcher,
            location: &location,
        };
        let violations: Vec<Violation> = self
            .boundary_rules()
            .filter_map(|rule| rule.check(&ctx, &dependency))
            .collect();
        if !violations.is_empty() {
            tracing::debug!(
                file = from_path,
                source = %edge.source,
                count = violations.len(),
                "dependency violations"
            );
        }
        violations
    }

    /// Runs every file rule against `path`.
    #[must_use]
    pub fn check_file(&self, path: &str) -> Vec<Violation> {
        let element = self.describe_element(path);
        let location = Location::file(path);
        self.file_rules()
            .filter_map(|rule| rule.check_file(&element, &location))
            .collect()
    }

    /// Checks a batch of `(file, edge, line, column)` imports plus every
    /// distinct importing file.
    #[must_use]
    pub fn check_all<'a, I>(&self, imports: I) -> LintResult
    where
        I: IntoIterator<Item = (&'a str, &'a DependencyEdge, usize, usize)>,
    {
        let mut result = LintResult::new();
        let mut files = std::collections::BTreeSet::new();
        for (file, edge, line, column) in imports {
            result
                .violations
                .extend(self.check_dependency(file, edge, line, column));
            result.dependencies_checked += 1;
            files.insert(file);
        }
        for file in &files {
            result.violations.extend(self.check_file(file));
        }
        result.files_checked = files.len();
        result
    }

    // ────────────────────────────────────────────
    // Cache
    // ────────────────────────────────────────────

    /// Fingerprint of the settings keying this engine's caches.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.cache.fingerprint()
    }

    /// Copies every cache table into a snapshot.
    #[must_use]
    pub fn cache_snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    /// Serializes every cache table to JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn serialize_cache(&self) -> Result<String, CacheError> {
        self.cache.snapshot().to_json()
    }

    /// Loads a JSON snapshot produced by an engine with identical settings.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the snapshot was taken for
    /// other settings.
    pub fn restore_cache(&self, json: &str) -> Result<(), CacheError> {
        self.cache.restore(CacheSnapshot::from_json(json)?)
    }

    /// Drops every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::ImportKind;
    use crate::relationship::Relationship;
    use crate::types::Severity;

    const CONFIG: &str = r#"
[[elements]]
type = "helpers"
pattern = "helpers/*"
capture = ["name"]

[[elements]]
type = "components"
pattern = "components/*"
capture = ["name"]

[[elements]]
type = "modules"
pattern = "modules/*"
capture = ["name"]

[element-types]
default = "disallow"

[[element-types.rules]]
from = "components"
allow = ["helpers", "components"]

[[element-types.rules]]
from = "modules"
allow = ["helpers", "components", "modules"]

[no-private]

[no-unknown-files]
severity = "warning"
"#;

    fn engine() -> Boundaries {
        Boundaries::from_toml(CONFIG).unwrap()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn engine_is_shareable() {
        assert_send_sync::<Boundaries>();
    }

    #[test]
    fn describe_dependency_between_elements() {
        let engine = engine();
        let edge = DependencyEdge::new("../../helpers/date").resolved("helpers/date/index.js");
        let d = engine.describe_dependency("components/button/index.js", &edge);
        assert_eq!(d.from.element_type.as_deref(), Some("components"));
        assert_eq!(d.to.element.element_type.as_deref(), Some("helpers"));
        assert_eq!(d.relationship, Relationship::None);
        assert_eq!(d.import_kind, ImportKind::Value);
    }

    #[test]
    fn element_types_verdicts() {
        let engine = engine();
        let allowed = engine.describe_dependency(
            "components/button/index.js",
            &DependencyEdge::new("x").resolved("helpers/date/index.js"),
        );
        assert!(engine.evaluate_element_types(&allowed).unwrap().allowed);

        let denied = engine.describe_dependency(
            "helpers/date/index.js",
            &DependencyEdge::new("x").resolved("modules/a/index.js"),
        );
        let verdict = engine.evaluate_element_types(&denied).unwrap();
        assert!(!verdict.allowed);
        assert!(verdict.is_default);
    }

    #[test]
    fn disabled_families_return_none() {
        let engine = engine();
        let d = engine.describe_dependency("helpers/a/x.js", &DependencyEdge::new("react"));
        assert!(engine.evaluate_entry_point(&d).is_none());
        assert!(engine.evaluate_external(&d).is_none());
        assert!(engine.evaluate_no_unknown(&d).is_none());
        assert!(engine.evaluate_no_ignored(&d).is_none());
    }

    #[test]
    fn check_dependency_reports_location() {
        let engine = engine();
        let violations = engine.check_dependency(
            "helpers/date/index.js",
            &DependencyEdge::new("../../modules/a").resolved("modules/a/index.js"),
            3,
            1,
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "BND001");
        assert_eq!(violations[0].location.line, 3);
        assert_eq!(violations[0].dependency.as_deref(), Some("../../modules/a"));
    }

    #[test]
    fn check_file_flags_unknown_files() {
        let engine = engine();
        let violations = engine.check_file("scripts/build.js");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert!(engine.check_file("helpers/date/index.js").is_empty());
        assert_eq!(engine.evaluate_no_unknown_files("scripts/build.js"), Some(false));
    }

    #[test]
    fn check_all_counts() {
        let engine = engine();
        let ok = DependencyEdge::new("x").resolved("helpers/date/index.js");
        let bad = DependencyEdge::new("y").resolved("modules/a/index.js");
        let result = engine.check_all([
            ("components/button/index.js", &ok, 1, 1),
            ("helpers/date/index.js", &bad, 2, 1),
            ("helpers/date/index.js", &ok, 3, 1),
        ]);
        assert_eq!(result.dependencies_checked, 3);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.violations.len(), 1);
        assert!(result.has_errors());
    }

    #[test]
    fn cache_round_trip_between_engines() {
        let first = engine();
        let _ = first.describe_element("components/button/index.js");
        let json = first.serialize_cache().unwrap();

        let second = engine();
        second.restore_cache(&json).unwrap();
        assert_eq!(second.cache_snapshot().elements.len(), first.cache_snapshot().elements.len());

        second.clear_cache();
        assert!(second.cache_snapshot().is_empty());
    }

    #[test]
    fn cache_from_other_settings_rejected() {
        let json = engine().serialize_cache().unwrap();
        let other =
            Boundaries::from_toml("[[elements]]\ntype = \"a\"\npattern = \"a/*\"\n").unwrap();
        assert!(matches!(
            other.restore_cache(&json),
            Err(CacheError::FingerprintMismatch { .. })
        ));
    }

    struct NoDeepImports;

    impl BoundaryRule for NoDeepImports {
        fn name(&self) -> &'static str {
            "no-deep-imports"
        }

        fn code(&self) -> &'static str {
            "HOST001"
        }

        fn check(
            &self,
            ctx: &RuleContext<'_>,
            dependency: &DependencyDescription,
        ) -> Option<Violation> {
            (dependency.to.source.matches('/').count() > 3).then(|| {
                Violation::new(
                    self.code(),
                    self.name(),
                    Severity::Warning,
                    ctx.location.clone(),
                    "import path is too deep",
                )
            })
        }
    }

    #[test]
    fn host_rules_run_after_families() {
        let engine = engine().with_rule(NoDeepImports);
        assert_eq!(engine.rule_count(), 4);
        let violations = engine.check_dependency(
            "helpers/date/index.js",
            &DependencyEdge::new("../../modules/a/b/c").resolved("modules/a/b/c.js"),
            1,
            1,
        );
        let codes: Vec<_> = violations.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["BND001", "HOST001"]);
    }
}
