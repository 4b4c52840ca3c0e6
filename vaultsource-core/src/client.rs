//! Secrets store client.
//!
//! Speaks the store's HTTP protocol:
//!
//! - read: `GET {base}/v1/{prefix}/{path}` with `X-Vault-Token`, expects `200`
//!   and `{"data": {...}}`
//! - login: `POST {base}/v1/auth/app-id/login` with `{"app_id", "user_id"}`,
//!   expects `200` and `{"auth": {"client_token": ...}}`
//! - revoke: `POST {base}/v1/auth/token/revoke/{token}`, expects `204`
//!
//! URL segments are joined with exactly one `/`; empty segments are skipped
//! wherever they occur, so the URL never contains `//` after the base or a
//! trailing `/`.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigProperties;
use crate::error::VaultError;
use crate::model::{SecretFieldMap, SecretPath, collapse_separators};
use crate::token::Credentials;
use crate::transport::{HttpRequest, TOKEN_HEADER, Transport};

/// API version segment prefixed to every endpoint.
pub const API_VERSION: &str = "v1";

const LOGIN_ENDPOINT: &str = "auth/app-id/login";
const REVOKE_ENDPOINT: &str = "auth/token/revoke";

/// Anything that can read the complete field map of a secret path.
///
/// [`VaultClient`] is the production implementation; the resolver only
/// depends on this trait.
pub trait SecretReader: Send + Sync {
    /// Fetch all fields stored at `path`.
    fn read_fields(&self, path: &SecretPath) -> Result<SecretFieldMap, VaultError>;
}

/// Authenticated client bound to one base URL, prefix and token.
pub struct VaultClient {
    base_url: String,
    secret_prefix: String,
    token: Credentials,
    transport: Arc<dyn Transport>,
}

impl VaultClient {
    /// Create a client.
    ///
    /// Trailing `/` are removed from `base_url`; empty segments are dropped
    /// from `secret_prefix`. An empty prefix is allowed.
    pub fn new(
        base_url: &str,
        secret_prefix: &str,
        token: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_prefix: collapse_separators(secret_prefix),
            token,
            transport,
        }
    }

    /// Create a client from configuration and an already resolved token.
    pub fn from_config(
        config: &ConfigProperties,
        token: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, VaultError> {
        let base_url = config.require_base_url()?;
        Ok(Self::new(base_url, config.secret_prefix(), token, transport))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn secret_prefix(&self) -> &str {
        &self.secret_prefix
    }

    /// The token presented on every call.
    pub fn token(&self) -> &Credentials {
        &self.token
    }

    /// URL a read of `path` is sent to.
    pub fn read_url(&self, path: &SecretPath) -> String {
        join_url(
            &self.base_url,
            &[API_VERSION, self.secret_prefix.as_str(), path.as_str()],
        )
    }

    /// Read all fields of a secret.
    pub fn read_fields(&self, path: &SecretPath) -> Result<SecretFieldMap, VaultError> {
        let url = self.read_url(path);
        tracing::debug!(path = %path, url = %url, "reading secret");

        let response = self.transport.execute(
            HttpRequest::get(&url).header(TOKEN_HEADER, self.token.expose()),
        )?;

        if response.status != 200 {
            tracing::error!(path = %path, url = %url, status = response.status, "can't read vault property");
            return Err(VaultError::SecretFetch {
                key: path.to_string(),
                token: self.token.expose().to_string(),
                url,
                status: response.status,
            });
        }

        let body: ReadResponse = response
            .json()
            .map_err(|e| VaultError::invalid_response(&url, e.to_string()))?;
        let data = body
            .data
            .ok_or_else(|| VaultError::invalid_response(&url, "response has no data object"))?;

        let fields = decode_fields(data);
        tracing::info!(path = %path, fields = fields.len(), "read of vault property successful");
        Ok(fields)
    }

    /// Revoke this client's token. Best-effort cleanup; reads do not depend
    /// on it.
    pub fn revoke(&self) -> Result<(), VaultError> {
        let url = join_url(
            &self.base_url,
            &[API_VERSION, REVOKE_ENDPOINT, self.token.expose()],
        );

        let response = self
            .transport
            .execute(HttpRequest::post(url).header(TOKEN_HEADER, self.token.expose()))?;

        if response.status != 204 {
            tracing::warn!(status = response.status, "revoke of vault token failed");
            return Err(VaultError::Revoke {
                status: response.status,
            });
        }

        tracing::info!("vault token revoked");
        Ok(())
    }
}

impl SecretReader for VaultClient {
    fn read_fields(&self, path: &SecretPath) -> Result<SecretFieldMap, VaultError> {
        VaultClient::read_fields(self, path)
    }
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .field("secret_prefix", &self.secret_prefix)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Obtain a token through app-id login.
pub fn login(
    transport: &dyn Transport,
    base_url: &str,
    app_id: &str,
    user_id: &str,
) -> Result<Credentials, VaultError> {
    let url = join_url(base_url, &[API_VERSION, LOGIN_ENDPOINT]);

    let response = transport.execute(HttpRequest::post(&url).json(serde_json::json!({
        "app_id": app_id,
        "user_id": user_id,
    })))?;

    if response.status != 200 {
        tracing::error!(url = %url, status = response.status, "login to vault failed");
        return Err(VaultError::Login {
            status: response.status,
        });
    }

    let body: LoginResponse = response
        .json()
        .map_err(|e| VaultError::invalid_response(&url, e.to_string()))?;
    let token = body
        .auth
        .and_then(|auth| auth.client_token)
        .ok_or_else(|| VaultError::invalid_response(&url, "response has no auth.client_token"))?;

    tracing::info!("login to vault successful");
    Ok(Credentials::new(token))
}

/// Join `base` and `segments` with single `/`, skipping empty segments,
/// including empty pieces inside a segment.
///
/// # Examples
///
/// ```
/// use vaultsource_core::client::join_url;
///
/// assert_eq!(join_url("http://vault/", &["v1", "/secret/", "db"]), "http://vault/v1/secret/db");
/// assert_eq!(join_url("http://vault", &["v1", "", ""]), "http://vault/v1");
/// ```
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for piece in segments.iter().flat_map(|segment| segment.split('/')) {
        if piece.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(piece);
    }
    url
}

#[derive(Deserialize)]
struct ReadResponse {
    data: Option<serde_json::Map<String, Value>>,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
}

/// Strings verbatim, scalars as JSON text, nested values as compact JSON,
/// nulls dropped.
fn decode_fields(data: serde_json::Map<String, Value>) -> SecretFieldMap {
    let fields: BTreeMap<String, String> = data
        .into_iter()
        .filter_map(|(field, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((field, s)),
            other => Some((field, other.to_string())),
        })
        .collect();
    SecretFieldMap::new(fields)
}
