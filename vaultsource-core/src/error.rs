//! Error taxonomy for placeholder resolution.
//!
//! Every failure surfaces as one [`VaultError`] variant. Nothing falls back to
//! the raw placeholder text: an unresolved `vault://` value used as a literal
//! would be a silent misconfiguration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while obtaining a token or resolving a secret.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Required configuration is missing or contradictory.
    #[error("{message}")]
    Configuration { message: String },

    /// The environment variable holding the token is not set.
    #[error("vault token environment variable '{var}' is not set")]
    TokenUnavailable { var: String },

    /// The token file is missing or unreadable.
    #[error("Can not read tokenfile from {}: {message}", path.display())]
    TokenFile { path: PathBuf, message: String },

    /// The app-id login endpoint answered with something other than 200.
    #[error("login to vault failed, return code is {status}")]
    Login { status: u16 },

    /// The HTTP call itself failed (connection refused, DNS, broken body...).
    #[error("transport error calling '{url}': {message}")]
    Transport { url: String, message: String },

    /// A secret read answered with something other than 200.
    ///
    /// The message carries the token verbatim.
    #[error(
        "read of vault property '{key}' with token '{token}' from url '{url}' failed, return code is '{status}'"
    )]
    SecretFetch {
        key: String,
        token: String,
        url: String,
        status: u16,
    },

    /// The secret path was read but does not contain the requested field.
    #[error("unable to read value '{field}' from vault property '{path}' - value not found")]
    FieldNotFound { field: String, path: String },

    /// A successful response did not have the documented JSON shape.
    #[error("unexpected response from '{url}': {message}")]
    InvalidResponse { url: String, message: String },

    /// Token revocation answered with something other than 204.
    #[error("revoke of vault token failed, return code is {status}")]
    Revoke { status: u16 },
}

impl VaultError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a transport error for the given URL.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-response error for the given URL.
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }
}
