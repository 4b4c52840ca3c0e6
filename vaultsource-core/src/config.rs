//! Startup configuration for placeholder resolution.
//!
//! Configuration lives in the `[vault]` table of a TOML file:
//!
//! ```toml
//! [vault]
//! enabled = true
//! base-url = "https://vault.example.com:8200"
//! secret-path = "secret/myapp"
//! properties = ["db.password", "api.key"]
//! token-source = "file"
//! file-token = "/run/secrets/vault-token"
//! ```
//!
//! # Default Locations
//!
//! The configuration file defaults to
//! `~/.config/vaultsource/vaultsource.toml` on Linux and the platform
//! equivalent elsewhere. The `file` token source defaults to
//! `<home>/.vault-token`.

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::VaultError;
use crate::token::TokenSource;

/// Environment variable consulted when no base URL is configured.
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";

/// File name of the default token file in the home directory.
pub const DEFAULT_TOKEN_FILE_NAME: &str = ".vault-token";

/// Resolved startup configuration. Read-only once loaded.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigProperties {
    /// Master switch. When off, every value passes through unchanged.
    pub enabled: bool,

    /// Base address of the store, e.g. `https://vault:8200`.
    pub base_url: Option<String>,

    /// Prefix prepended to every secret path (mount and folder).
    pub secret_path: Option<String>,

    /// Dotted keys to load eagerly (`a.b.field`).
    #[serde(deserialize_with = "deserialize_property_keys")]
    pub properties: Vec<String>,

    /// Strategy used to obtain the client token.
    pub token_source: TokenSource,

    /// Variable name for the `environment` token source.
    pub environment_token: Option<String>,

    /// Token file for the `file` token source.
    pub file_token: Option<PathBuf>,

    /// App id for the `login` token source.
    pub app_id: Option<String>,

    /// User id for the `login` token source.
    pub user_id: Option<String>,

    /// Also emit `key@field` entries for every field of a resolved secret.
    pub expose_compound_fields: bool,
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    vault: ConfigProperties,
}

impl ConfigProperties {
    /// Parse a TOML document, applying the `VAULT_ADDR` fallback.
    pub fn from_toml_str(contents: &str) -> Result<Self, VaultError> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| VaultError::config(format!("invalid vault configuration: {}", e)))?;
        let mut config = file.vault;
        config.fill_base_url(std::env::var(VAULT_ADDR_ENV).ok());
        Ok(config)
    }

    /// Use `vault_addr` as base URL when none is configured.
    pub fn fill_base_url(&mut self, vault_addr: Option<String>) {
        if non_empty(self.base_url.as_deref()).is_none() {
            self.base_url = vault_addr.filter(|addr| !addr.is_empty());
        }
    }

    /// The base URL, validated.
    pub fn require_base_url(&self) -> Result<&str, VaultError> {
        let base_url = non_empty(self.base_url.as_deref()).ok_or_else(|| {
            VaultError::config(format!(
                "base-url not set and {} is empty",
                VAULT_ADDR_ENV
            ))
        })?;

        url::Url::parse(base_url)
            .map_err(|e| VaultError::config(format!("invalid base-url '{}': {}", base_url, e)))?;

        Ok(base_url)
    }

    /// The secret-path prefix, empty when unset.
    pub fn secret_prefix(&self) -> &str {
        self.secret_path.as_deref().unwrap_or("")
    }

    /// Token file to read: the configured one, or `<home>/.vault-token`.
    pub fn token_file_path(&self) -> Result<PathBuf, VaultError> {
        match self.file_token.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => Ok(path.clone()),
            None => default_token_file(),
        }
    }
}

impl fmt::Debug for ConfigProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // user-id acts as the password of app-id login
        f.debug_struct("ConfigProperties")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("secret_path", &self.secret_path)
            .field("properties", &self.properties)
            .field("token_source", &self.token_source)
            .field("environment_token", &self.environment_token)
            .field("file_token", &self.file_token)
            .field("app_id", &self.app_id)
            .field("user_id", &self.user_id.as_ref().map(|_| "[REDACTED]"))
            .field("expose_compound_fields", &self.expose_compound_fields)
            .finish()
    }
}

/// `<home>/.vault-token`.
pub fn default_token_file() -> Result<PathBuf, VaultError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DEFAULT_TOKEN_FILE_NAME))
        .ok_or_else(|| VaultError::config("home directory not available for default token file"))
}

/// Default location of the configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "raibid-labs", "vaultsource")
        .map(|dirs| dirs.config_dir().join("vaultsource.toml"))
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ConfigProperties, VaultError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        VaultError::config(format!(
            "failed to read configuration from {}: {}",
            path.display(),
            e
        ))
    })?;
    ConfigProperties::from_toml_str(&contents)
}

/// Split a comma-separated key list, trimming entries and dropping blanks.
pub fn split_property_keys(keys: &str) -> Vec<String> {
    keys.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn deserialize_property_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keys {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Keys::deserialize(deserializer)? {
        Keys::List(keys) => keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
        Keys::Csv(keys) => split_property_keys(&keys),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = ConfigProperties::from_toml_str(
            r#"
            [vault]
            enabled = true
            base-url = "http://someBaseUrl"
            secret-path = "someSecretPath"
            properties = "keyOne.key1, keyOne, keyTwo, keyThree.value, keyFour.key4"
            token-source = "file"
            environment-token = "someEnvVariable"
            file-token = "someFile"
            app-id = "someAppId"
            user-id = "someUserId"
            "#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.base_url.as_deref(), Some("http://someBaseUrl"));
        assert_eq!(config.secret_path.as_deref(), Some("someSecretPath"));
        assert_eq!(
            config.properties,
            vec!["keyOne.key1", "keyOne", "keyTwo", "keyThree.value", "keyFour.key4"]
        );
        assert_eq!(config.token_source, TokenSource::File);
        assert_eq!(config.environment_token.as_deref(), Some("someEnvVariable"));
        assert_eq!(config.file_token, Some(PathBuf::from("someFile")));
        assert_eq!(config.app_id.as_deref(), Some("someAppId"));
        assert_eq!(config.user_id.as_deref(), Some("someUserId"));
        assert!(!config.expose_compound_fields);
    }

    #[test]
    fn test_properties_as_list() {
        let config = ConfigProperties::from_toml_str(
            r#"
            [vault]
            base-url = "http://vault"
            properties = [" a.b ", "", "c"]
            "#,
        )
        .unwrap();
        assert_eq!(config.properties, vec!["a.b", "c"]);
    }

    #[test]
    fn test_missing_table_is_disabled_and_undefined() {
        let config = ConfigProperties::from_toml_str("").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.token_source, TokenSource::Undefined);
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_unknown_token_source_rejected() {
        let result = ConfigProperties::from_toml_str(
            r#"
            [vault]
            token-source = "kerberos"
            "#,
        );
        assert!(matches!(result, Err(VaultError::Configuration { .. })));
    }

    #[test]
    fn test_token_source_grammar_matches_from_str() {
        for (raw, expected) in [
            ("LOGIN", TokenSource::Login),
            (" File ", TokenSource::File),
            ("environment", TokenSource::Environment),
            ("", TokenSource::Undefined),
        ] {
            let config = ConfigProperties::from_toml_str(&format!(
                "[vault]\ntoken-source = \"{}\"",
                raw
            ))
            .unwrap();
            assert_eq!(config.token_source, expected, "token-source = {raw:?}");
            assert_eq!(raw.parse::<TokenSource>().unwrap(), expected);
        }
    }

    #[test]
    fn test_base_url_fallback_only_when_unset() {
        let mut config = ConfigProperties::default();
        config.fill_base_url(Some("http://from-env:8200".to_string()));
        assert_eq!(config.base_url.as_deref(), Some("http://from-env:8200"));

        let mut config = ConfigProperties {
            base_url: Some("http://configured".to_string()),
            ..Default::default()
        };
        config.fill_base_url(Some("http://from-env:8200".to_string()));
        assert_eq!(config.base_url.as_deref(), Some("http://configured"));

        let mut config = ConfigProperties {
            base_url: Some(String::new()),
            ..Default::default()
        };
        config.fill_base_url(Some("http://from-env:8200".to_string()));
        assert_eq!(config.base_url.as_deref(), Some("http://from-env:8200"));
    }

    #[test]
    fn test_require_base_url() {
        let config = ConfigProperties::default();
        assert!(matches!(
            config.require_base_url(),
            Err(VaultError::Configuration { .. })
        ));

        let config = ConfigProperties {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(config.require_base_url().is_err());

        let config = ConfigProperties {
            base_url: Some("http://vault:8200/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.require_base_url().unwrap(), "http://vault:8200/");
    }

    #[test]
    fn test_token_file_default() {
        let config = ConfigProperties::default();
        if let Ok(path) = config.token_file_path() {
            assert!(path.ends_with(DEFAULT_TOKEN_FILE_NAME));
        }

        let config = ConfigProperties {
            file_token: Some(PathBuf::from("/tmp/token")),
            ..Default::default()
        };
        assert_eq!(config.token_file_path().unwrap(), PathBuf::from("/tmp/token"));
    }

    #[test]
    fn test_debug_redacts_user_id() {
        let config = ConfigProperties {
            user_id: Some("very-secret-user".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret-user"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[vault]\nenabled = true\nbase-url = \"http://vault\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.enabled);

        let missing = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(VaultError::Configuration { .. })));
    }

    #[test]
    fn test_split_property_keys() {
        assert_eq!(split_property_keys(" a , b,,c "), vec!["a", "b", "c"]);
        assert!(split_property_keys("").is_empty());
    }
}
