//! Parsing of secret references.
//!
//! Two surface syntaxes map onto the same [`Placeholder`]:
//!
//! - Marked values: `vault://secret/path#field`. Split on the last `#`; with no
//!   `#` the whole remainder is the field of the root path, and an empty field
//!   means [`DEFAULT_FIELD`](crate::model::DEFAULT_FIELD).
//! - Dotted configuration keys: `a.b.field` is path `a/b`, field `field`.
//!
//! Parsing is pure and infallible.

use std::fmt;

use crate::model::{FieldName, SecretPath};

/// Prefix marking a configuration value as a secret reference.
pub const MARKER: &str = "vault://";

/// A parsed reference to one field of one secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    /// Secret to read.
    pub secret_path: SecretPath,

    /// Field to extract from the secret.
    pub field: FieldName,
}

impl Placeholder {
    /// Create a placeholder from its parts.
    pub fn new(secret_path: impl Into<SecretPath>, field: impl Into<FieldName>) -> Self {
        Self {
            secret_path: secret_path.into(),
            field: field.into(),
        }
    }

    /// Whether a raw configuration value carries the [`MARKER`].
    pub fn is_placeholder(raw: &str) -> bool {
        raw.starts_with(MARKER)
    }

    /// Parse a marked value such as `vault://testpath#value`.
    ///
    /// The marker is stripped when present; callers decide beforehand whether
    /// the value should be treated as a placeholder at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultsource_core::Placeholder;
    ///
    /// let p = Placeholder::parse("vault://testpath#value");
    /// assert_eq!(p.secret_path.as_str(), "testpath");
    /// assert_eq!(p.field.as_str(), "value");
    ///
    /// let p = Placeholder::parse("vault://value");
    /// assert!(p.secret_path.is_root());
    /// assert_eq!(p.field.as_str(), "value");
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(MARKER) {
            Some(rest) => {
                let (path, field) = split_last(rest, '#');
                let field = if field.is_empty() {
                    FieldName::default_field()
                } else {
                    FieldName::new(field)
                };
                Self {
                    secret_path: SecretPath::new(path),
                    field,
                }
            }
            None => {
                let (path, field) = split_last(raw, '#');
                Self::new(path, field)
            }
        }
    }

    /// Parse a dotted configuration key such as `a.b.field`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaultsource_core::Placeholder;
    ///
    /// let p = Placeholder::from_property_key("a.b.field");
    /// assert_eq!(p.secret_path.as_str(), "a/b");
    /// assert_eq!(p.field.as_str(), "field");
    /// ```
    pub fn from_property_key(key: &str) -> Self {
        let (path, field) = split_last(key, '.');
        Self::new(path.replace('.', "/"), field)
    }

    /// Render back to marker syntax.
    pub fn to_uri(&self) -> String {
        if self.secret_path.is_root() {
            format!("{}{}", MARKER, self.field)
        } else {
            format!("{}{}#{}", MARKER, self.secret_path, self.field)
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

/// Split on the last `sep`. Without a separator the path is empty and the
/// whole input is the field.
fn split_last(raw: &str, sep: char) -> (&str, &str) {
    match raw.rfind(sep) {
        Some(idx) => (&raw[..idx], &raw[idx + sep.len_utf8()..]),
        None => ("", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_field() {
        let p = Placeholder::parse("vault://testpath#value");
        assert_eq!(p, Placeholder::new("testpath", "value"));
    }

    #[test]
    fn test_parse_field_only_is_root() {
        let p = Placeholder::parse("vault://value");
        assert_eq!(p, Placeholder::new("", "value"));
    }

    #[test]
    fn test_parse_splits_on_last_hash() {
        let p = Placeholder::parse("vault://team#a/db#password");
        assert_eq!(p.secret_path.as_str(), "team#a/db");
        assert_eq!(p.field.as_str(), "password");
    }

    #[test]
    fn test_parse_normalizes_path_separators() {
        let p = Placeholder::parse("vault:///db/main/#user");
        assert_eq!(p.secret_path.as_str(), "db/main");
        assert_eq!(p.field.as_str(), "user");
    }

    #[test]
    fn test_parse_omitted_field_defaults_to_value() {
        assert_eq!(Placeholder::parse("vault://"), Placeholder::new("", "value"));
        assert_eq!(
            Placeholder::parse("vault://db#"),
            Placeholder::new("db", "value")
        );
    }

    #[test]
    fn test_parse_without_marker() {
        assert_eq!(Placeholder::parse("db#user"), Placeholder::new("db", "user"));
        assert_eq!(Placeholder::parse(""), Placeholder::new("", ""));
    }

    #[test]
    fn test_property_key_dotted() {
        let p = Placeholder::from_property_key("a.b.field");
        assert_eq!(p, Placeholder::new("a/b", "field"));
    }

    #[test]
    fn test_property_key_without_dot() {
        assert_eq!(
            Placeholder::from_property_key("keyTwo"),
            Placeholder::new("", "keyTwo")
        );
        assert_eq!(Placeholder::from_property_key(""), Placeholder::new("", ""));
    }

    #[test]
    fn test_is_placeholder() {
        assert!(Placeholder::is_placeholder("vault://x#y"));
        assert!(!Placeholder::is_placeholder("plain"));
        assert!(!Placeholder::is_placeholder("Vault://x"));
    }

    #[test]
    fn test_to_uri() {
        assert_eq!(
            Placeholder::new("db", "user").to_uri(),
            "vault://db#user"
        );
        assert_eq!(Placeholder::new("", "value").to_string(), "vault://value");
    }
}
