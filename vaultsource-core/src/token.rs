//! Client token acquisition.
//!
//! This module provides:
//! - [`TokenSource`] - Which strategy obtains the token
//! - [`Credentials`] - The token itself, redacted in logs and zeroed on drop
//! - [`TokenProvider`] - Runs the configured strategy once
//!
//! Strategies are mutually exclusive; exactly one is selected by
//! `token-source`. Nothing is refreshed or rotated after resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::client;
use crate::config::ConfigProperties;
use crate::error::VaultError;
use crate::transport::Transport;

/// Strategy used to obtain the client token.
///
/// Parsed case-insensitively from configuration; an empty string means
/// [`Undefined`](TokenSource::Undefined).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TokenSource {
    /// Not configured. Resolution fails.
    #[default]
    Undefined,

    /// Read `<file-token>` or `<home>/.vault-token`.
    File,

    /// App-id login against the store.
    Login,

    /// Read the variable named by `environment-token`.
    Environment,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::File => "file",
            Self::Login => "login",
            Self::Environment => "environment",
        }
    }
}

impl TryFrom<String> for TokenSource {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TokenSource {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "undefined" => Ok(Self::Undefined),
            "file" => Ok(Self::File),
            "login" => Ok(Self::Login),
            "environment" => Ok(Self::Environment),
            other => Err(VaultError::config(format!(
                "unknown token source '{}' (expected file, login or environment)",
                other
            ))),
        }
    }
}

/// A client token.
///
/// The value is only reachable through [`expose()`](Credentials::expose).
/// Debug and Display print `[REDACTED]`, and the buffer is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Expose the token.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials([REDACTED])")
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Credentials {}

/// Resolves one token according to [`ConfigProperties::token_source`].
pub struct TokenProvider {
    transport: Arc<dyn Transport>,
}

impl TokenProvider {
    /// Create a provider. The transport is only used by the login strategy.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run the configured strategy.
    pub fn resolve(&self, config: &ConfigProperties) -> Result<Credentials, VaultError> {
        match config.token_source {
            TokenSource::Undefined => Err(VaultError::config("tokenSource not set")),
            TokenSource::Environment => {
                let var = config
                    .environment_token
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        VaultError::config("token-source is environment but environment-token is not set")
                    })?;
                tracing::info!(var, "reading vault token from environment");
                read_token_from_env(var)
            }
            TokenSource::File => {
                let path = config.token_file_path()?;
                tracing::info!(path = %path.display(), "reading vault token from file");
                read_token_from_file(&path)
            }
            TokenSource::Login => {
                let base_url = config.require_base_url()?;
                let app_id = required(config.app_id.as_deref(), "app-id")?;
                let user_id = required(config.user_id.as_deref(), "user-id")?;
                tracing::info!(app_id, "obtaining vault token via app-id login");
                client::login(self.transport.as_ref(), base_url, app_id, user_id)
            }
        }
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider").finish_non_exhaustive()
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, VaultError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| VaultError::config(format!("token-source is login but {} is not set", name)))
}

/// Read the token from an environment variable, verbatim.
///
/// Only an unset variable is [`VaultError::TokenUnavailable`]; a set but
/// empty value is returned as is.
pub fn read_token_from_env(var: &str) -> Result<Credentials, VaultError> {
    match std::env::var(var) {
        Ok(token) => Ok(Credentials::new(token)),
        Err(std::env::VarError::NotPresent) => Err(VaultError::TokenUnavailable {
            var: var.to_string(),
        }),
        Err(std::env::VarError::NotUnicode(_)) => Err(VaultError::config(format!(
            "vault token environment variable '{}' is not valid unicode",
            var
        ))),
    }
}

/// Read the token from a file, removing every whitespace character.
pub fn read_token_from_file(path: &Path) -> Result<Credentials, VaultError> {
    let contents = std::fs::read_to_string(path).map_err(|e| VaultError::TokenFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let token: String = contents.chars().filter(|c| !c.is_whitespace()).collect();
    if token.is_empty() {
        return Err(VaultError::TokenFile {
            path: path.to_path_buf(),
            message: "file contains no token".to_string(),
        });
    }

    Ok(Credentials::new(token))
}
