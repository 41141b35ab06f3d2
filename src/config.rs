use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::XmlGraphError;
use crate::mapping::MappingConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub xmlgraph: XmlGraphConfig,
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub import: ImportConfig,
    pub mapping: MappingConfig,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct XmlGraphConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for XmlGraphConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Graph database connection
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    /// Name of the environment variable holding the password
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// Target database; the server default when unset
    #[serde(default)]
    pub database: Option<String>,
}

impl Neo4jConfig {
    /// Read the password from the configured environment variable
    pub fn password(&self) -> crate::error::Result<String> {
        std::env::var(&self.password_env).map_err(|_| {
            XmlGraphError::Config(format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your Neo4j password.",
                self.password_env
            ))
        })
    }
}

/// What to import
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportConfig {
    /// XML file, or directory searched recursively for `.xml` files
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_password_env() -> String {
    "NEO4J_PASSWORD".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in XMLGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("XMLGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_path(&config_path)
    }

    /// Load configuration from an explicit path (.env is still honored)
    pub fn from_path(config_path: &Path) -> Result<Self> {
        // Optional file, errors ignored
        let _ = dotenv::dotenv();

        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.neo4j.uri.trim().is_empty() {
            anyhow::bail!("neo4j.uri must not be empty");
        }

        if self.neo4j.user.trim().is_empty() {
            anyhow::bail!("neo4j.user must not be empty");
        }

        if self.neo4j.password_env.trim().is_empty() {
            anyhow::bail!("neo4j.password_env must name an environment variable");
        }

        self.mapping
            .validate()
            .context("Invalid [mapping] section")?;

        Ok(())
    }

    /// Input path from config, if any
    pub fn import_path(&self) -> Option<&Path> {
        self.import.path.as_deref()
    }
}
