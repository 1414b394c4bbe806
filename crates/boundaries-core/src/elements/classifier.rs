//! Path → element classification.
//!
//! The path is walked from the file toward the project root. At every step
//! the accumulated segments are tested against the catalog; the first match
//! is the element itself and every later match is an enclosing element.
//!
//! ```text
//! modules/a/modules/b/index.js
//!                     index.js          no match
//!                   b/index.js          no match
//!           modules/b/index.js          modules (own, `modules/*/**/*`)
//!         a                             no match
//! modules/a                             modules (parent, `modules/*`)
//! ```

use std::sync::Arc;

use crate::cache::CacheLayer;
use crate::elements::{
    name_captures, CapturedValues, ElementDescriptor, ElementInfo, MatchMode, ParentElement,
};
use crate::matcher::PathMatcher;
use crate::settings::Settings;

/// Normalizes a project path to forward slashes without `./` or trailing `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_end_matches('/').to_string()
}

/// One descriptor hit found while walking a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMatch {
    /// Type of the matching descriptor.
    pub element_type: String,
    /// Root of the matched element.
    pub element_path: String,
    /// Named captures, base captures merged in.
    pub captured_values: CapturedValues,
}

/// Splits the walk result into the element itself and its ancestors.
///
/// `matches` must be in walk order (nearest first).
#[must_use]
pub fn partition(path: &str, matches: Vec<BoundaryMatch>) -> ElementInfo {
    let mut iter = matches.into_iter();
    let Some(own) = iter.next() else {
        return ElementInfo::unknown(path);
    };

    let internal_path = match path.strip_prefix(&format!("{}/", own.element_path)) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => path.rsplit('/').next().unwrap_or(path).to_string(),
    };
    let parents = iter
        .map(|m| ParentElement {
            element_type: m.element_type,
            element_path: m.element_path,
            captured_values: m.captured_values,
        })
        .collect();

    ElementInfo {
        path: path.to_string(),
        element_type: Some(own.element_type),
        element_path: Some(own.element_path),
        internal_path: Some(internal_path),
        captured_values: own.captured_values,
        parents,
        is_ignored: false,
    }
}

/// Classifies paths against the settings' element catalog.
#[derive(Debug)]
pub struct ElementClassifier {
    settings: Arc<Settings>,
    matcher: Arc<PathMatcher>,
    cache: Arc<CacheLayer>,
}

impl ElementClassifier {
    /// Creates a classifier sharing the engine's matcher and cache.
    #[must_use]
    pub fn new(settings: Arc<Settings>, matcher: Arc<PathMatcher>, cache: Arc<CacheLayer>) -> Self {
        Self {
            settings,
            matcher,
            cache,
        }
    }

    /// Classifies a project-relative path.
    #[must_use]
    pub fn classify(&self, path: &str) -> ElementInfo {
        let path = normalize_path(path);
        if let Some(hit) = self.cache.elements().get(&path) {
            tracing::trace!(path, "element cache hit");
            return hit;
        }

        let info = if self.settings.is_ignored(&path, &self.matcher) {
            tracing::debug!(path, "path ignored by include/ignore settings");
            ElementInfo::ignored(&path)
        } else {
            partition(&path, self.find_matches(&path))
        };

        tracing::debug!(
            path,
            element_type = info.element_type.as_deref().unwrap_or("<unknown>"),
            parents = info.parents.len(),
            "classified element"
        );
        self.cache.elements().insert(path, info.clone());
        info
    }

    /// Walks `path` root-ward and records every descriptor hit.
    fn find_matches(&self, path: &str) -> Vec<BoundaryMatch> {
        let segments: Vec<&str> = path.split('/').collect();
        let mut matches = Vec::new();
        // Segments at or after `claimed_end` belong to an element already found.
        let mut claimed_end = segments.len();

        for start in (0..segments.len()).rev() {
            let searching_own = matches.is_empty();
            let found = self.settings.elements().iter().find_map(|descriptor| {
                self.match_descriptor(descriptor, &segments, start, claimed_end, searching_own)
            });
            if let Some(found) = found {
                matches.push(found);
                claimed_end = start;
            }
        }

        matches
    }

    fn match_descriptor(
        &self,
        descriptor: &ElementDescriptor,
        segments: &[&str],
        start: usize,
        claimed_end: usize,
        searching_own: bool,
    ) -> Option<BoundaryMatch> {
        let accumulated = segments[start..claimed_end].join("/");
        let full_path = segments.join("/");
        let mode = descriptor.mode();

        descriptor.patterns().iter().find_map(|pattern| {
            if !self.captures_fit(descriptor, pattern) {
                return None;
            }
            let (test_pattern, subject) = match (searching_own, mode) {
                (true, MatchMode::Folder) => (format!("{pattern}/**/*"), accumulated.as_str()),
                (true, MatchMode::Full) => (pattern.clone(), full_path.as_str()),
                _ => (pattern.clone(), accumulated.as_str()),
            };
            let captures = self.matcher.capture(&test_pattern, subject)?;

            let base_values = match descriptor.base_pattern() {
                Some(base) => {
                    let unclaimed = segments[..claimed_end].join("/");
                    self.base_captures(base, &test_pattern, &unclaimed)?
                }
                None => Vec::new(),
            };

            let element_path = if searching_own && mode == MatchMode::Full {
                full_path.clone()
            } else {
                self.element_path(pattern, segments, start, claimed_end)
            };

            let mut captured_values = name_captures(descriptor.base_capture_names(), &base_values);
            captured_values.extend(name_captures(descriptor.capture_names(), &captures));

            Some(BoundaryMatch {
                element_type: descriptor.element_type().to_string(),
                element_path,
                captured_values,
            })
        })
    }

    /// A descriptor naming more captures than its pattern produces never
    /// matches.
    fn captures_fit(&self, descriptor: &ElementDescriptor, pattern: &str) -> bool {
        let groups = |p: &str| self.matcher.compile(p).map_or(0, |c| c.group_count());
        let own = descriptor.capture_names().len() <= groups(pattern);
        let base = descriptor
            .base_pattern()
            .map_or(true, |base| descriptor.base_capture_names().len() <= groups(base));
        if !(own && base) {
            tracing::trace!(
                element_type = descriptor.element_type(),
                pattern,
                "capture names exceed pattern groups"
            );
        }
        own && base
    }

    /// Captures of `base` when `<base>/**/<pattern>` matches the unclaimed
    /// part of the path.
    fn base_captures(&self, base: &str, pattern: &str, unclaimed: &str) -> Option<Vec<String>> {
        let combined = format!("{base}/**/{pattern}");
        let mut values = self.matcher.capture(&combined, unclaimed)?;
        let base_groups = self.matcher.compile(base).ok()?.group_count();
        values.truncate(base_groups);
        Some(values)
    }

    /// The path up to the shortest run of accumulated segments that matches
    /// the raw pattern; the whole accumulated run if none does.
    fn element_path(
        &self,
        pattern: &str,
        segments: &[&str],
        start: usize,
        claimed_end: usize,
    ) -> String {
        let end = (start + 1..=claimed_end)
            .find(|&end| {
                self.matcher
                    .capture(pattern, &segments[start..end].join("/"))
                    .is_some()
            })
            .unwrap_or(claimed_end);
        segments[..end].join("/")
    }
}
