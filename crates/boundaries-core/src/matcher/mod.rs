//! Cached glob matching with positional captures.
//!
//! [`PathMatcher`] is the single entry point every other component uses to
//! test paths, type names and captured values against glob patterns. It
//! keeps the compiled regex of every distinct pattern it has seen and
//! memoizes capture and boolean results in the engine's [`CacheLayer`].

pub mod glob;

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::{cache_key, CacheLayer};

pub use glob::{CompiledPattern, PatternError};

/// Glob matcher backed by the per-configuration cache.
#[derive(Debug)]
pub struct PathMatcher {
    compiled: DashMap<String, Arc<CompiledPattern>>,
    cache: Arc<CacheLayer>,
}

impl PathMatcher {
    /// Creates a matcher writing results into `cache`.
    #[must_use]
    pub fn new(cache: Arc<CacheLayer>) -> Self {
        Self {
            compiled: DashMap::new(),
            cache,
        }
    }

    /// Returns the compiled form of `pattern`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is malformed.
    pub fn compile(&self, pattern: &str) -> Result<Arc<CompiledPattern>, PatternError> {
        if let Some(found) = self.compiled.get(pattern) {
            return Ok(Arc::clone(found.value()));
        }
        let compiled = Arc::new(CompiledPattern::new(pattern)?);
        self.compiled
            .insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Matches `path` against `pattern`, returning the captured substrings.
    ///
    /// Patterns produced at query time (rendered templates) may be
    /// malformed; those never match.
    #[must_use]
    pub fn capture(&self, pattern: &str, path: &str) -> Option<Vec<String>> {
        let key = cache_key(&[pattern, path]);
        if let Some(hit) = self.cache.captures().get(&key) {
            return hit;
        }

        let result = match self.compile(pattern) {
            Ok(compiled) => compiled.captures(path),
            Err(e) => {
                tracing::debug!(pattern, error = %e, "pattern rejected at match time");
                None
            }
        };
        self.cache.captures().insert(key, result.clone());
        result
    }

    /// Tests whether `path` matches at least one of `patterns`.
    #[must_use]
    pub fn is_match<S: AsRef<str>>(&self, path: &str, patterns: &[S]) -> bool {
        if patterns.is_empty() {
            return false;
        }
        let mut parts: Vec<&str> = patterns.iter().map(AsRef::as_ref).collect();
        parts.push(path);
        let key = cache_key(&parts);
        if let Some(hit) = self.cache.matches().get(&key) {
            return hit;
        }

        let result = patterns.iter().any(|pattern| match self.compile(pattern.as_ref()) {
            Ok(compiled) => compiled.is_match(path),
            Err(e) => {
                tracing::debug!(
                    pattern = pattern.as_ref(),
                    error = %e,
                    "pattern rejected at match time"
                );
                false
            }
        });
        self.cache.matches().insert(key, result);
        result
    }

    /// Returns the number of distinct compiled patterns.
    #[must_use]
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }
}
