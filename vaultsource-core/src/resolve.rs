//! Placeholder resolution.
//!
//! This module provides:
//! - [`PlaceholderResolver`] - Turns raw configuration values into secrets
//! - [`VaultConnector`] - Lazily obtains a token and client on first use
//!
//! A value is only resolved when resolution is enabled and the value starts
//! with `vault://`; anything else passes through unchanged without touching
//! the token source or the network. Failures are never swallowed: an
//! unresolvable placeholder is an error, not a literal.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vaultsource_core::{ConfigProperties, PlaceholderResolver, ReqwestTransport};
//!
//! # fn main() -> Result<(), vaultsource_core::VaultError> {
//! let config = ConfigProperties::from_toml_str(r#"
//!     [vault]
//!     enabled = true
//!     base-url = "http://127.0.0.1:8200"
//!     token-source = "file"
//! "#)?;
//! let resolver = PlaceholderResolver::from_config(config, Arc::new(ReqwestTransport::new()?));
//! let password = resolver.resolve_value("vault://db#password")?;
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::cache::SecretCache;
use crate::client::{SecretReader, VaultClient};
use crate::config::ConfigProperties;
use crate::error::VaultError;
use crate::model::{FieldName, SecretFieldMap, SecretPath};
use crate::placeholder::Placeholder;
use crate::token::TokenProvider;
use crate::transport::Transport;

/// Separator between a key and a field name in compound-field entries.
pub const COMPOUND_FIELD_SEPARATOR: char = '@';

/// Resolves `vault://` placeholders, fetching each secret path at most once.
///
/// Owns its [`SecretCache`]; independent resolvers never share fetched
/// secrets. Safe to share across threads.
pub struct PlaceholderResolver {
    enabled: bool,
    expose_compound_fields: bool,
    property_keys: Vec<String>,
    reader: Arc<dyn SecretReader>,
    cache: SecretCache,
}

impl PlaceholderResolver {
    /// Create an enabled resolver reading through `reader`.
    pub fn new(reader: Arc<dyn SecretReader>) -> Self {
        Self {
            enabled: true,
            expose_compound_fields: false,
            property_keys: Vec::new(),
            reader,
            cache: SecretCache::new(),
        }
    }

    /// Create a resolver from configuration.
    ///
    /// The token is resolved and the client built on the first cache miss,
    /// not here.
    pub fn from_config(config: ConfigProperties, transport: Arc<dyn Transport>) -> Self {
        let enabled = config.enabled;
        let expose_compound_fields = config.expose_compound_fields;
        let property_keys = config.properties.clone();
        let connector = VaultConnector::new(config, transport);

        Self::new(Arc::new(connector))
            .with_enabled(enabled)
            .with_compound_fields(expose_compound_fields)
            .with_property_keys(property_keys)
    }

    /// Switch resolution on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Emit `key@field` entries during bulk resolution.
    pub fn with_compound_fields(mut self, expose: bool) -> Self {
        self.expose_compound_fields = expose;
        self
    }

    /// Dotted keys loaded by [`load_property_keys`](Self::load_property_keys).
    pub fn with_property_keys(mut self, keys: Vec<String>) -> Self {
        self.property_keys = keys;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The resolver's cache.
    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    /// Resolve one raw configuration value.
    ///
    /// Returns `raw` unchanged when resolution is disabled or the value is
    /// not a placeholder.
    pub fn resolve_value(&self, raw: &str) -> Result<String, VaultError> {
        if !self.enabled || !Placeholder::is_placeholder(raw) {
            return Ok(raw.to_string());
        }

        let placeholder = Placeholder::parse(raw);
        self.resolve_placeholder(&placeholder)
    }

    /// Resolve a parsed placeholder, regardless of the enabled flag.
    pub fn resolve_placeholder(&self, placeholder: &Placeholder) -> Result<String, VaultError> {
        let fields = self.fetch(&placeholder.secret_path)?;
        lookup(&fields, &placeholder.secret_path, &placeholder.field).map(String::from)
    }

    /// Resolve every value of a flat property set.
    ///
    /// Non-placeholder values are copied unchanged. With compound fields
    /// enabled, each resolved key `k` also yields `k@<field>` for every field
    /// of its secret.
    pub fn resolve_properties<I, K, V>(&self, properties: I) -> Result<BTreeMap<String, String>, VaultError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut resolved = BTreeMap::new();

        for (key, raw) in properties {
            let key = key.into();
            let raw = raw.as_ref();

            if !self.enabled || !Placeholder::is_placeholder(raw) {
                resolved.insert(key, raw.to_string());
                continue;
            }

            let placeholder = Placeholder::parse(raw);
            let fields = self.fetch(&placeholder.secret_path)?;
            let value = lookup(&fields, &placeholder.secret_path, &placeholder.field)?;

            if self.expose_compound_fields {
                insert_compound_fields(&mut resolved, &key, &fields);
            }
            resolved.insert(key, value.to_string());
        }

        Ok(resolved)
    }

    /// Load the configured dotted keys (`a.b.field` reads field `field` of
    /// path `a/b`).
    ///
    /// Keys sharing a path are served from one fetch. Returns an empty map
    /// when resolution is disabled.
    pub fn load_property_keys(&self) -> Result<BTreeMap<String, String>, VaultError> {
        let mut resolved = BTreeMap::new();
        if !self.enabled {
            return Ok(resolved);
        }

        let mut by_path: BTreeMap<SecretPath, Vec<(&str, FieldName)>> = BTreeMap::new();
        for key in &self.property_keys {
            let placeholder = Placeholder::from_property_key(key);
            by_path
                .entry(placeholder.secret_path)
                .or_default()
                .push((key.as_str(), placeholder.field));
        }

        for (path, keys) in by_path {
            let fields = self.fetch(&path)?;
            for (key, field) in keys {
                let value = lookup(&fields, &path, &field)?;
                if self.expose_compound_fields {
                    insert_compound_fields(&mut resolved, key, &fields);
                }
                resolved.insert(key.to_string(), value.to_string());
            }
        }

        Ok(resolved)
    }

    fn fetch(&self, path: &SecretPath) -> Result<SecretFieldMap, VaultError> {
        self.cache
            .get_or_fetch(path, |path| self.reader.read_fields(path))
    }
}

impl fmt::Debug for PlaceholderResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderResolver")
            .field("enabled", &self.enabled)
            .field("expose_compound_fields", &self.expose_compound_fields)
            .field("property_keys", &self.property_keys)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn lookup<'a>(
    fields: &'a SecretFieldMap,
    path: &SecretPath,
    field: &FieldName,
) -> Result<&'a str, VaultError> {
    match fields.get(field) {
        Some(value) => {
            tracing::info!(field = %field, path = %path, "read of value from vault property successful");
            Ok(value)
        }
        None => Err(VaultError::FieldNotFound {
            field: field.to_string(),
            path: path.to_string(),
        }),
    }
}

fn insert_compound_fields(out: &mut BTreeMap<String, String>, key: &str, fields: &SecretFieldMap) {
    for (field, value) in fields.iter() {
        out.insert(
            format!("{}{}{}", key, COMPOUND_FIELD_SEPARATOR, field),
            value.to_string(),
        );
    }
}

/// Builds the authenticated [`VaultClient`] on first use and reuses it.
///
/// The token source runs exactly once, on the first successful connect.
pub struct VaultConnector {
    config: ConfigProperties,
    transport: Arc<dyn Transport>,
    client: Mutex<Option<Arc<VaultClient>>>,
}

impl VaultConnector {
    pub fn new(config: ConfigProperties, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            client: Mutex::new(None),
        }
    }

    /// The connected client, resolving the token if this is the first call.
    pub fn client(&self) -> Result<Arc<VaultClient>, VaultError> {
        let mut client = self.client.lock();
        if let Some(client) = client.as_ref() {
            return Ok(client.clone());
        }

        let token = TokenProvider::new(self.transport.clone()).resolve(&self.config)?;
        let connected = Arc::new(VaultClient::from_config(
            &self.config,
            token,
            self.transport.clone(),
        )?);
        tracing::debug!(client = ?connected, "connected to vault");

        *client = Some(connected.clone());
        Ok(connected)
    }

    /// Whether a client has been built.
    pub fn is_connected(&self) -> bool {
        self.client.lock().is_some()
    }
}

impl SecretReader for VaultConnector {
    fn read_fields(&self, path: &SecretPath) -> Result<SecretFieldMap, VaultError> {
        self.client()?.read_fields(path)
    }
}

impl fmt::Debug for VaultConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConnector")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
