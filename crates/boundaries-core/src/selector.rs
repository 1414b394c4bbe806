//! Element selectors and `${...}` template rendering.
//!
//! Configuration accepts three selector shapes:
//!
//! ```toml
//! from = "helpers"                                   # type
//! from = ["components", { family = "${family}" }]    # type with captures
//! from = ["helpers", ["components", { family = "atoms" }]]   # list
//! ```
//!
//! [`normalize`] flattens all of them into canonical [`Selector`]s before any
//! matching happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::ElementInfo;
use crate::matcher::{glob, PathMatcher};

/// A string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single value.
    One(String),
    /// Several values.
    Many(Vec<String>),
}

impl OneOrMany {
    /// Returns the values as a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Selector as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSelector {
    /// Element type pattern.
    Type(String),
    /// Element type pattern plus captured-value patterns.
    TypeWithCaptures(String, BTreeMap<String, OneOrMany>),
    /// Several selectors; any may match.
    List(Vec<RawSelector>),
}

/// Canonical selector: a type pattern and per-capture value patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selector {
    /// Glob over element type names (templates allowed).
    pub element_type: String,
    /// Capture name → accepted value patterns (templates allowed).
    pub captured: BTreeMap<String, Vec<String>>,
}

impl Selector {
    /// Selector matching every element of `element_type`.
    #[must_use]
    pub fn of_type(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            captured: BTreeMap::new(),
        }
    }

    /// Adds a captured-value constraint.
    #[must_use]
    pub fn capture(mut self, name: impl Into<String>, patterns: Vec<String>) -> Self {
        self.captured.insert(name.into(), patterns);
        self
    }

    /// Returns true if `element` has a matching type and every constrained
    /// capture matches one of its patterns.
    ///
    /// Unknown elements never match.
    #[must_use]
    pub fn matches(
        &self,
        element: &ElementInfo,
        data: &TemplateData<'_>,
        matcher: &PathMatcher,
    ) -> bool {
        let Some(element_type) = element.element_type.as_deref() else {
            return false;
        };
        if !matcher.is_match(element_type, &[data.render_glob(&self.element_type)]) {
            return false;
        }
        self.captured.iter().all(|(name, patterns)| {
            let Some(value) = element.captured_values.get(name) else {
                return false;
            };
            let rendered: Vec<String> = patterns.iter().map(|p| data.render_glob(p)).collect();
            matcher.is_match(value, &rendered)
        })
    }

    /// Element type names this selector references literally.
    ///
    /// Globs and templates are skipped; they cannot be checked statically.
    #[must_use]
    pub fn literal_type(&self) -> Option<&str> {
        let is_literal = !self.element_type.contains(['*', '?', '{', '[', '(', '!', '$']);
        is_literal.then_some(self.element_type.as_str())
    }
}

/// Flattens a configured selector into canonical selectors.
#[must_use]
pub fn normalize(raw: RawSelector) -> Vec<Selector> {
    match raw {
        RawSelector::Type(element_type) => vec![Selector::of_type(element_type)],
        RawSelector::TypeWithCaptures(element_type, captured) => vec![Selector {
            element_type,
            captured: captured
                .into_iter()
                .map(|(name, patterns)| (name, patterns.into_vec()))
                .collect(),
        }],
        RawSelector::List(items) => items.into_iter().flat_map(normalize).collect(),
    }
}

/// Replaces every `${key}` in `template` with `lookup(key)`.
///
/// Placeholders the lookup does not know are left untouched.
#[must_use]
pub fn render_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match lookup(key) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Values available to selector templates: the two ends of a dependency.
#[derive(Debug, Clone, Copy)]
pub struct TemplateData<'a> {
    from: &'a ElementInfo,
    target: Option<&'a ElementInfo>,
}

impl<'a> TemplateData<'a> {
    /// Template data for a dependency from `from` to `target`.
    #[must_use]
    pub fn new(from: &'a ElementInfo, target: Option<&'a ElementInfo>) -> Self {
        Self { from, target }
    }

    /// Looks up a key.
    ///
    /// `from.<x>` and bare `<x>` read the importing element, `to.<x>` and
    /// `target.<x>` read the imported one. `type` is the element type; any
    /// other name is a captured value.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        let (element, name) = if let Some(name) = key.strip_prefix("from.") {
            (Some(self.from), name)
        } else if let Some(name) = key.strip_prefix("to.").or_else(|| key.strip_prefix("target.")) {
            (self.target, name)
        } else {
            (Some(self.from), key)
        };
        element_value(element?, name)
    }

    /// Renders `template` against this data.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        if !template.contains("${") {
            return template.to_string();
        }
        render_template(template, |key| self.lookup(key))
    }

    /// Renders a glob `template`; substituted values match only themselves.
    #[must_use]
    pub fn render_glob(&self, template: &str) -> String {
        if !template.contains("${") {
            return template.to_string();
        }
        render_template(template, |key| self.lookup(key).map(|v| glob::escape(&v)))
    }
}

/// `type` or a captured value of `element`.
#[must_use]
pub fn element_value(element: &ElementInfo, name: &str) -> Option<String> {
    match name {
        "type" => element.element_type.clone(),
        "internalPath" | "internal_path" => element.internal_path.clone(),
        _ => element.captured_values.get(name).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::CacheLayer;
    use crate::elements::CapturedValues;

    fn element(element_type: &str, captures: &[(&str, &str)]) -> ElementInfo {
        ElementInfo {
            path: "x".into(),
            element_type: Some(element_type.into()),
            element_path: Some("x".into()),
            internal_path: Some("index.js".into()),
            captured_values: captures
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<CapturedValues>(),
            parents: vec![],
            is_ignored: false,
        }
    }

    fn matcher() -> PathMatcher {
        PathMatcher::new(Arc::new(CacheLayer::new("test")))
    }

    #[test]
    fn raw_selector_shapes_deserialize() {
        let raw: RawSelector = serde_json::from_str(r#""helpers""#).unwrap();
        assert_eq!(raw, RawSelector::Type("helpers".into()));

        let raw: RawSelector =
            serde_json::from_str(r#"["components", {"family": "atoms"}]"#).unwrap();
        assert!(matches!(raw, RawSelector::TypeWithCaptures(..)));

        let raw: RawSelector = serde_json::from_str(r#"["helpers", "components"]"#).unwrap();
        assert_eq!(normalize(raw).len(), 2);
    }

    #[test]
    fn normalize_flattens_nested_lists() {
        let raw: RawSelector = serde_json::from_str(
            r#"["helpers", ["components", {"family": ["atoms", "molecules"]}]]"#,
        )
        .unwrap();
        let selectors = normalize(raw);
        assert_eq!(
            selectors,
            vec![
                Selector::of_type("helpers"),
                Selector::of_type("components")
                    .capture("family", vec!["atoms".into(), "molecules".into()]),
            ]
        );
    }

    #[test]
    fn type_and_captures_must_match() {
        let m = matcher();
        let atom = element("components", &[("family", "atoms")]);
        let data = TemplateData::new(&atom, None);

        assert!(Selector::of_type("components").matches(&atom, &data, &m));
        assert!(Selector::of_type("comp*").matches(&atom, &data, &m));
        assert!(!Selector::of_type("helpers").matches(&atom, &data, &m));
        assert!(Selector::of_type("components")
            .capture("family", vec!["atoms".into()])
            .matches(&atom, &data, &m));
        assert!(!Selector::of_type("components")
            .capture("family", vec!["molecules".into()])
            .matches(&atom, &data, &m));
        assert!(!Selector::of_type("components")
            .capture("missing", vec!["*".into()])
            .matches(&atom, &data, &m));
    }

    #[test]
    fn templates_reference_both_ends() {
        let m = matcher();
        let from = element("components", &[("family", "atoms")]);
        let same = element("components", &[("family", "atoms")]);
        let other = element("components", &[("family", "molecules")]);

        let selector = Selector::of_type("components").capture("family", vec!["${family}".into()]);
        assert!(selector.matches(&same, &TemplateData::new(&from, Some(&same)), &m));
        assert!(!selector.matches(&other, &TemplateData::new(&from, Some(&other)), &m));

        let data = TemplateData::new(&from, Some(&other));
        assert_eq!(data.render("${from.family}/${target.family}"), "atoms/molecules");
        assert_eq!(data.render("${to.type}"), "components");
        assert_eq!(data.render("${nope}"), "${nope}");
    }

    #[test]
    fn captured_glob_syntax_matches_literally() {
        let m = matcher();
        let from = element("pages", &[("route", "[id]")]);
        let same = element("pages", &[("route", "[id]")]);
        let letter = element("pages", &[("route", "i")]);

        let selector = Selector::of_type("pages").capture("route", vec!["${route}".into()]);
        assert!(selector.matches(&same, &TemplateData::new(&from, Some(&same)), &m));
        assert!(!selector.matches(&letter, &TemplateData::new(&from, Some(&letter)), &m));

        let data = TemplateData::new(&from, None);
        assert_eq!(data.render_glob("${route}/*"), r"\[id\]/*");
        assert_eq!(data.render("${route}"), "[id]");
    }

    #[test]
    fn unknown_elements_never_match() {
        let unknown = ElementInfo::unknown("a.js");
        let data = TemplateData::new(&unknown, None);
        assert!(!Selector::of_type("*").matches(&unknown, &data, &matcher()));
    }

    #[test]
    fn render_template_edge_cases() {
        let lookup = |key: &str| (key == "a").then(|| "A".to_string());
        assert_eq!(render_template("x${a}y${a}", lookup), "xAyA");
        assert_eq!(render_template("${ a }", lookup), "A");
        assert_eq!(render_template("${a", lookup), "${a");
        assert_eq!(render_template("${b}${a}", lookup), "${b}A");
    }

    #[test]
    fn literal_types() {
        assert_eq!(Selector::of_type("helpers").literal_type(), Some("helpers"));
        assert_eq!(Selector::of_type("comp*").literal_type(), None);
        assert_eq!(Selector::of_type("${type}").literal_type(), None);
    }
}
