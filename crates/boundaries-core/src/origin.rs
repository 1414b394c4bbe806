//! Dependency origin classification: local, external, built-in or unknown.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{cache_key, CacheLayer};
use crate::matcher::PathMatcher;
use crate::settings::Settings;

/// Node.js core modules, used when no built-in list is configured.
pub const NODE_BUILT_IN_MODULES: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

const NODE_PREFIX: &str = "node:";

/// Where an imported module comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// A file of the analyzed project.
    Local,
    /// A third-party package.
    External,
    /// A runtime built-in module.
    BuiltIn,
    /// An unresolved import that is not flagged as external.
    Unknown,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::External => "external",
            Self::BuiltIn => "built-in",
            Self::Unknown => "unknown",
        })
    }
}

/// Origin of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginInfo {
    /// Origin category.
    pub origin: Origin,
    /// True when the resolved path is excluded by include/ignore settings.
    #[serde(default)]
    pub is_ignored: bool,
    /// Package name for external and built-in modules.
    pub base_module: Option<String>,
    /// Part of the specifier after the package name.
    pub sub_path: Option<String>,
    /// Resolved path, relative to the project root when inside it.
    pub resolved_path: Option<String>,
}

impl OriginInfo {
    fn new(origin: Origin, resolved_path: Option<String>) -> Self {
        Self {
            origin,
            is_ignored: false,
            base_module: None,
            sub_path: None,
            resolved_path,
        }
    }

    fn with_module(mut self, specifier: &str) -> Self {
        let stripped = specifier.strip_prefix(NODE_PREFIX).unwrap_or(specifier);
        let (base, sub) = split_module(stripped);
        self.base_module = Some(base);
        self.sub_path = sub;
        self
    }

    /// Local project file.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.origin == Origin::Local
    }

    /// Third-party package.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.origin == Origin::External
    }

    /// Runtime built-in.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        self.origin == Origin::BuiltIn
    }

    /// Unresolved and not external.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.origin == Origin::Unknown
    }
}

/// Splits a package specifier into its base module and sub path.
///
/// Scoped packages keep their scope: `@scope/pkg/a/b` → (`@scope/pkg`,
/// `a/b`).
#[must_use]
pub fn split_module(specifier: &str) -> (String, Option<String>) {
    let take = if specifier.starts_with('@') { 2 } else { 1 };
    let mut parts = specifier.splitn(take + 1, '/');
    let base: Vec<&str> = parts.by_ref().take(take).collect();
    let sub = parts.next().filter(|s| !s.is_empty()).map(ToString::to_string);
    (base.join("/"), sub)
}

/// A bare specifier names a package rather than a path (`^(@|\w)`).
#[must_use]
pub fn is_bare_specifier(specifier: &str) -> bool {
    specifier
        .chars()
        .next()
        .is_some_and(|c| c == '@' || c == '_' || c.is_ascii_alphanumeric())
}

fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Result of relativizing a resolved path against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath {
    /// Project-relative path, or the normalized input when outside the root.
    pub path: String,
    /// True when the path is not below the root.
    pub outside_root: bool,
}

/// Converts a resolved path to project-relative form.
///
/// Relative paths are taken as already relative to the root; they are
/// outside it when they climb above it with `..`. Absolute paths are inside
/// only when the root is absolute and a prefix of them.
#[must_use]
pub fn project_path(root: &str, resolved: &str) -> ProjectPath {
    let resolved = normalize_segments(&resolved.replace('\\', "/"));
    let absolute = is_absolute(&resolved);

    if !absolute {
        let outside_root = resolved == ".." || resolved.starts_with("../");
        return ProjectPath {
            path: resolved,
            outside_root,
        };
    }

    let root = normalize_segments(&root.replace('\\', "/"));
    if is_absolute(&root) {
        let prefix = if root.ends_with('/') {
            root.clone()
        } else {
            format!("{root}/")
        };
        if let Some(rest) = resolved.strip_prefix(&prefix) {
            return ProjectPath {
                path: rest.to_string(),
                outside_root: false,
            };
        }
    }
    ProjectPath {
        path: resolved,
        outside_root: true,
    }
}

fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic())
}

/// Resolves `.` and `..` segments lexically.
fn normalize_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|last| *last != "..") {
                    out.pop();
                } else if !absolute {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    let joined = out.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Classifies the origin of imports under fixed settings.
#[derive(Debug)]
pub struct OriginClassifier {
    settings: Arc<Settings>,
    matcher: Arc<PathMatcher>,
    cache: Arc<CacheLayer>,
}

impl OriginClassifier {
    /// Creates a classifier sharing the engine's matcher and cache.
    #[must_use]
    pub fn new(settings: Arc<Settings>, matcher: Arc<PathMatcher>, cache: Arc<CacheLayer>) -> Self {
        Self {
            settings,
            matcher,
            cache,
        }
    }

    /// Classifies `specifier`, given the path the host resolved it to.
    #[must_use]
    pub fn classify(&self, specifier: &str, resolved_path: Option<&str>) -> OriginInfo {
        let key = match resolved_path {
            Some(resolved) => cache_key(&[resolved, specifier]),
            None => specifier.to_string(),
        };
        self.cache
            .origins()
            .get_or_insert_with(&key, || self.compute(specifier, resolved_path))
    }

    fn compute(&self, specifier: &str, resolved_path: Option<&str>) -> OriginInfo {
        let policy = self.settings.flag_as_external();
        let matches_custom = self
            .matcher
            .is_match(specifier, &policy.custom_source_patterns);

        let Some(resolved) = resolved_path else {
            let info = if self.is_built_in(specifier) {
                OriginInfo::new(Origin::BuiltIn, None).with_module(specifier)
            } else if is_bare_specifier(specifier)
                || (policy.unresolvable_alias && !is_relative_specifier(specifier))
                || matches_custom
            {
                OriginInfo::new(Origin::External, None).with_module(specifier)
            } else {
                OriginInfo::new(Origin::Unknown, None)
            };
            tracing::debug!(specifier, origin = %info.origin, "classified unresolved import");
            return info;
        };

        let project = project_path(self.settings.root_path(), resolved);
        let is_ignored = self.settings.is_ignored(&project.path, &self.matcher);
        let in_node_modules = project.path.split('/').any(|s| s == "node_modules");
        let flagged = (policy.in_node_modules && in_node_modules)
            || (policy.outside_root_path && project.outside_root)
            || matches_custom;

        // Ignored paths never reach the external policy.
        let info = if !is_ignored && flagged {
            OriginInfo::new(Origin::External, Some(project.path)).with_module(specifier)
        } else {
            OriginInfo {
                is_ignored,
                ..OriginInfo::new(Origin::Local, Some(project.path))
            }
        };
        tracing::debug!(
            specifier,
            resolved,
            origin = %info.origin,
            ignored = info.is_ignored,
            "classified resolved import"
        );
        info
    }

    fn is_built_in(&self, specifier: &str) -> bool {
        if specifier.starts_with(NODE_PREFIX) {
            return true;
        }
        let (base, sub) = split_module(specifier);
        let full = match &sub {
            Some(sub) => format!("{base}/{sub}"),
            None => base.clone(),
        };
        self.settings
            .built_in_modules()
            .iter()
            .any(|m| *m == base || *m == full)
    }
}
