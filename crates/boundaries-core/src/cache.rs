//! Per-configuration memoization.
//!
//! One [`CacheLayer`] is created for every engine instance and shared by the
//! matcher, the element classifier and the origin classifier. It is tagged
//! with the fingerprint of the settings it was built for, so a snapshot can
//! only be restored into an engine with identical settings.
//!
//! Entries are never evicted; [`CacheLayer::clear`] drops everything.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::elements::ElementInfo;
use crate::origin::OriginInfo;

/// Separator between the parts of a composite cache key.
const KEY_SEPARATOR: &str = "\u{1f}";

/// Joins key parts with a separator that cannot appear in paths or patterns.
#[must_use]
pub fn cache_key(parts: &[&str]) -> String {
    parts.join(KEY_SEPARATOR)
}

/// Computes the BLAKE3 fingerprint of a serializable value.
///
/// Used to key caches by settings content rather than by object identity.
#[must_use]
pub fn fingerprint<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Errors raised when restoring a cache snapshot.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The snapshot was produced for different settings.
    #[error("cache snapshot belongs to settings {found}, expected {expected}")]
    FingerprintMismatch {
        /// Fingerprint of the current settings.
        expected: String,
        /// Fingerprint recorded in the snapshot.
        found: String,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("invalid cache snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// A concurrent string-keyed memo table.
#[derive(Debug)]
pub struct MemoStore<V> {
    entries: DashMap<String, V>,
}

impl<V> Default for MemoStore<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V: Clone> MemoStore<V> {
    /// Returns a copy of the cached value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Stores a value, replacing any previous one.
    pub fn insert(&self, key: String, value: V) {
        self.entries.insert(key, value);
    }

    /// Returns the cached value or computes and stores it.
    ///
    /// No shard lock is held while `compute` runs.
    pub fn get_or_insert_with(&self, key: &str, compute: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let value = compute();
        self.entries.insert(key.to_string(), value.clone());
        value
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn snapshot(&self) -> BTreeMap<String, V> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn restore(&self, values: BTreeMap<String, V>) {
        for (key, value) in values {
            self.entries.insert(key, value);
        }
    }
}

/// Plain key → value copy of a [`CacheLayer`].
///
/// Compiled patterns are not part of it; they are rebuilt on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Fingerprint of the settings the entries were computed with.
    pub fingerprint: String,
    /// Element classifications by path.
    #[serde(default)]
    pub elements: BTreeMap<String, ElementInfo>,
    /// Origin classifications by specifier / resolved path.
    #[serde(default)]
    pub origins: BTreeMap<String, OriginInfo>,
    /// Glob captures by pattern and path.
    #[serde(default)]
    pub captures: BTreeMap<String, Option<Vec<String>>>,
    /// Boolean glob results by pattern list and path.
    #[serde(default)]
    pub matches: BTreeMap<String, bool>,
}

impl CacheSnapshot {
    /// Encodes the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, CacheError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is not a snapshot.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len() + self.origins.len() + self.captures.len() + self.matches.len()
    }

    /// Returns true if the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The memo tables of one configuration.
#[derive(Debug)]
pub struct CacheLayer {
    fingerprint: String,
    elements: MemoStore<ElementInfo>,
    origins: MemoStore<OriginInfo>,
    captures: MemoStore<Option<Vec<String>>>,
    matches: MemoStore<bool>,
}

impl CacheLayer {
    /// Creates empty tables for the configuration with `fingerprint`.
    #[must_use]
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            elements: MemoStore::default(),
            origins: MemoStore::default(),
            captures: MemoStore::default(),
            matches: MemoStore::default(),
        }
    }

    /// Fingerprint of the owning configuration.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Element classifications by path.
    #[must_use]
    pub fn elements(&self) -> &MemoStore<ElementInfo> {
        &self.elements
    }

    /// Origin classifications.
    #[must_use]
    pub fn origins(&self) -> &MemoStore<OriginInfo> {
        &self.origins
    }

    /// Glob captures.
    #[must_use]
    pub fn captures(&self) -> &MemoStore<Option<Vec<String>>> {
        &self.captures
    }

    /// Boolean glob results.
    #[must_use]
    pub fn matches(&self) -> &MemoStore<bool> {
        &self.matches
    }

    /// Drops every entry of every table.
    pub fn clear(&self) {
        self.elements.clear();
        self.origins.clear();
        self.captures.clear();
        self.matches.clear();
    }

    /// Copies all entries into a serializable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            fingerprint: self.fingerprint.clone(),
            elements: self.elements.snapshot(),
            origins: self.origins.snapshot(),
            captures: self.captures.snapshot(),
            matches: self.matches.snapshot(),
        }
    }

    /// Loads a snapshot taken from a layer with the same fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::FingerprintMismatch`] if the snapshot was taken
    /// for different settings; nothing is loaded in that case.
    pub fn restore(&self, snapshot: CacheSnapshot) -> Result<(), CacheError> {
        if snapshot.fingerprint != self.fingerprint {
            tracing::warn!(
                expected = %self.fingerprint,
                found = %snapshot.fingerprint,
                "rejecting cache snapshot from other settings"
            );
            return Err(CacheError::FingerprintMismatch {
                expected: self.fingerprint.clone(),
                found: snapshot.fingerprint,
            });
        }
        tracing::debug!(entries = snapshot.len(), "restoring cache snapshot");
        self.elements.restore(snapshot.elements);
        self.origins.restore(snapshot.origins);
        self.captures.restore(snapshot.captures);
        self.matches.restore(snapshot.matches);
        Ok(())
    }
}
