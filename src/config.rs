//! Startup configuration
//!
//! Positional arguments name the document root, the correlated resource
//! file and an optional port. An optional YAML file tunes the listener.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::resource::{CorrelatedTable, ServerContext};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Static file server with correlated resource redirects", long_about = None)]
pub struct Cli {
    /// Document root directory
    pub root: PathBuf,

    /// Correlated resource definitions, one `path<TAB>ipv4<TAB>port` per line
    pub correlated_file: PathBuf,

    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// YAML file with listener settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("document root {} is not a directory", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("correlated resource file {} is not a regular file", .0.display())]
    DefinitionsNotFile(PathBuf),
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("max_connections must be at least 1")]
    NoConnections,
}

/// Contents of the optional YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub max_connections: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl FileConfig {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a mapping.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&source)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub root: PathBuf,
    pub correlated_file: PathBuf,
}

impl Config {
    /// Validates the command line and merges in the YAML settings.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        if !cli.root.is_dir() {
            return Err(ConfigError::RootNotDirectory(cli.root.clone()));
        }
        if !cli.correlated_file.is_file() {
            return Err(ConfigError::DefinitionsNotFile(cli.correlated_file.clone()));
        }

        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        if file.server.max_connections == 0 {
            return Err(ConfigError::NoConnections);
        }

        Ok(Self {
            server: ServerConfig {
                listen_addr: format!("{}:{}", file.server.host, cli.port),
                max_connections: file.server.max_connections,
            },
            root: cli.root.clone(),
            correlated_file: cli.correlated_file.clone(),
        })
    }

    /// Loads the correlated table and bundles it with the document root.
    pub fn load_context(&self) -> anyhow::Result<ServerContext> {
        let table = CorrelatedTable::load(&self.correlated_file)?;
        Ok(ServerContext::new(self.root.clone(), table))
    }
}
