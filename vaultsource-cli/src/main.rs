//! Vaultsource CLI
//!
//! Command-line interface for resolving `vault://` placeholders.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a single value
//! vaultsource resolve 'vault://db#password'
//!
//! # Resolve every value of a TOML file
//! vaultsource render app.toml --format json
//!
//! # Load the keys listed in the `properties` setting
//! vaultsource load
//!
//! # Revoke the configured token
//! vaultsource revoke
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use vaultsource_core::{
    ConfigProperties, PlaceholderResolver, ReqwestTransport, VaultConnector, default_config_path,
    load_config,
};

mod flatten;

#[derive(Parser)]
#[command(name = "vaultsource")]
#[command(about = "Resolve vault:// placeholders against a Vault secrets store")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one raw value (e.g., vault://db#password)
    Resolve {
        /// Raw configuration value
        value: String,
    },

    /// Resolve every value of a TOML file
    Render {
        /// TOML file to render
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Load the dotted keys listed in the `properties` setting
    Load {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Revoke the configured token
    Revoke,

    /// Print the effective configuration
    CheckConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve { value } => resolve_value(config, &value),
        Commands::Render { file, format } => render_file(config, &file, format),
        Commands::Load { format } => load_properties(config, format),
        Commands::Revoke => revoke_token(config),
        Commands::CheckConfig => check_config(&config),
    }
}

/// Initialize logging on stderr so stdout only carries resolved output.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the explicit file, or the default location when it exists.
fn load_configuration(explicit: Option<&Path>) -> Result<ConfigProperties> {
    if let Some(path) = explicit {
        return load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.exists() => load_config(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        _ => {
            tracing::debug!("no configuration file found, using defaults");
            ConfigProperties::from_toml_str("").context("Failed to build default configuration")
        }
    }
}

fn build_resolver(config: ConfigProperties) -> Result<PlaceholderResolver> {
    let transport = ReqwestTransport::new().context("Failed to create HTTP transport")?;
    Ok(PlaceholderResolver::from_config(config, Arc::new(transport)))
}

fn resolve_value(config: ConfigProperties, value: &str) -> Result<()> {
    let resolver = build_resolver(config)?;
    let resolved = resolver
        .resolve_value(value)
        .with_context(|| format!("Failed to resolve '{}'", value))?;
    println!("{}", resolved);
    Ok(())
}

fn render_file(config: ConfigProperties, file: &Path, format: OutputFormat) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: toml::Table = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let resolver = build_resolver(config)?;
    let resolved = resolver
        .resolve_properties(flatten::flatten(&document))
        .with_context(|| format!("Failed to resolve {}", file.display()))?;

    print_properties(&resolved, format)
}

fn load_properties(config: ConfigProperties, format: OutputFormat) -> Result<()> {
    if !config.enabled {
        tracing::warn!("vault resolution is disabled, nothing to load");
    }

    let resolver = build_resolver(config)?;
    let loaded = resolver
        .load_property_keys()
        .context("Failed to load configured properties")?;

    print_properties(&loaded, format)
}

fn revoke_token(config: ConfigProperties) -> Result<()> {
    let transport = ReqwestTransport::new().context("Failed to create HTTP transport")?;
    let connector = VaultConnector::new(config, Arc::new(transport));

    connector
        .client()
        .context("Failed to connect to vault")?
        .revoke()
        .context("Failed to revoke token")?;

    println!("Token revoked");
    Ok(())
}

fn check_config(config: &ConfigProperties) -> Result<()> {
    println!("{:#?}", config);

    if config.enabled {
        config
            .require_base_url()
            .context("Resolution is enabled but the base URL is unusable")?;
    }
    Ok(())
}

fn print_properties(properties: &BTreeMap<String, String>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(properties)
                .context("Failed to serialize output")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for (key, value) in properties {
                println!("{}={}", key, value);
            }
        }
    }
    Ok(())
}
