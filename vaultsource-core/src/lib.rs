//! # Vaultsource Core
//!
//! Resolves `vault://path#field` placeholders in configuration values
//! against a Vault-compatible secrets store.
//!
//! This crate provides:
//! - Placeholder parsing and secret path/field types
//! - Token acquisition from a file, an environment variable or app-id login
//! - A blocking HTTP client for the store's read, login and revoke endpoints
//! - A per-path cache guaranteeing one fetch per secret
//! - The resolver tying these together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vaultsource_core::{load_config, PlaceholderResolver, ReqwestTransport};
//!
//! fn database_password() -> Result<String, vaultsource_core::VaultError> {
//!     let config = load_config("vaultsource.toml".as_ref())?;
//!     let resolver = PlaceholderResolver::from_config(config, Arc::new(ReqwestTransport::new()?));
//!     resolver.resolve_value("vault://db#password")
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod placeholder;
pub mod resolve;
pub mod token;
pub mod transport;

// Re-export commonly used types at crate root
pub use model::{
    FieldName,
    SecretFieldMap,
    SecretPath,
    DEFAULT_FIELD,
};

pub use placeholder::{
    Placeholder,
    MARKER,
};

pub use error::VaultError;

pub use config::{
    ConfigProperties,
    default_config_path,
    load_config,
};

pub use token::{
    Credentials,
    TokenProvider,
    TokenSource,
};

pub use transport::{
    HttpRequest,
    HttpResponse,
    MemoryTransport,
    Method,
    Transport,
};

#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;

pub use client::{
    SecretReader,
    VaultClient,
};

pub use cache::SecretCache;

pub use resolve::{
    PlaceholderResolver,
    VaultConnector,
};
