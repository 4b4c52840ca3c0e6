//! Domain model types for vaultsource.
//!
//! - [`SecretPath`] - Normalized location of a secret in the store
//! - [`FieldName`] - Name of one value inside a secret
//! - [`SecretFieldMap`] - Immutable field map produced by one secret read

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field implied when a placeholder names no field at all.
pub const DEFAULT_FIELD: &str = "value";

/// Location of a secret in the store, relative to the configured prefix.
///
/// Empty segments are dropped on construction, so `/a//b/` becomes `a/b`.
/// The empty path is valid and denotes the root of the configured mount.
///
/// # Examples
///
/// ```
/// use vaultsource_core::SecretPath;
///
/// assert_eq!(SecretPath::new("/db/main/").as_str(), "db/main");
/// assert!(SecretPath::root().is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecretPath(String);

impl SecretPath {
    /// Create a new secret path, dropping empty segments.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(collapse_separators(path.as_ref()))
    }

    /// The root path of the configured mount.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the root (empty) path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecretPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SecretPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Name of one value within a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldName(String);

impl FieldName {
    /// Create a new field name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The reserved `value` field.
    pub fn default_field() -> Self {
        Self(DEFAULT_FIELD.to_string())
    }

    /// Get the field name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// All fields of one secret, as returned by a single read.
///
/// Cheap to clone; the underlying map is shared and never mutated after
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretFieldMap(Arc<BTreeMap<String, String>>);

impl SecretFieldMap {
    /// Wrap a decoded field map.
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self(Arc::new(fields))
    }

    /// Look up one field.
    pub fn get(&self, field: &FieldName) -> Option<&str> {
        self.0.get(field.as_str()).map(String::as_str)
    }

    /// Whether the field is present.
    pub fn contains(&self, field: &FieldName) -> bool {
        self.0.contains_key(field.as_str())
    }

    /// Iterate over `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretFieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Join the non-empty `/`-separated segments of `path` with single `/`.
pub(crate) fn collapse_separators(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
