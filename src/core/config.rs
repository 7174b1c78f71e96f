/// Server and Tool Configuration
///
/// Server settings come from environment variables. Tool settings come from
/// a YAML file (`kmcp.yaml` by default) with one section per tool:
///
/// ```yaml
/// tools:
///   echo:
///     prefix: "Echo: "
///   custom_tool:
///     prefix: "Handled: "
/// ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Which transports the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
    Both,
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            "both" => Ok(TransportMode::Both),
            other => Err(format!("must be 'stdio', 'http', or 'both', got '{}'", other)),
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Server name as reported in MCP initialize responses
    pub name: String,
    /// Server version string as reported in MCP initialize responses
    pub version: String,
    pub transport: TransportMode,
    /// Bind address for HTTP mode
    pub host: String,
    pub port: u16,
    /// HTTP worker count override; defaults to the CPU count capped at 16
    pub workers: Option<usize>,
    /// Location of the tool configuration file
    pub tool_config_path: PathBuf,
}

impl ServerConfig {
    /// Read settings from the process environment.
    ///
    /// - SERVER_NAME (default: "mcp-tool-server")
    /// - SERVER_VERSION (default: crate version)
    /// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
    /// - HOST (default: "0.0.0.0")
    /// - PORT (default: 3000)
    /// - WORKER_THREADS (optional)
    /// - MCP_CONFIG (default: "kmcp.yaml")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let transport_raw = get("MCP_TRANSPORT_MODE", "stdio");
        let transport = transport_raw
            .parse::<TransportMode>()
            .map_err(|reason| ConfigError::InvalidEnv {
                key: "MCP_TRANSPORT_MODE",
                value: transport_raw.clone(),
                reason,
            })?;

        let port_raw = get("PORT", "3000");
        let port = port_raw
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnv {
                key: "PORT",
                value: port_raw.clone(),
                reason: e.to_string(),
            })?;

        let workers = match lookup("WORKER_THREADS") {
            None => None,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                Ok(_) => {
                    return Err(ConfigError::InvalidEnv {
                        key: "WORKER_THREADS",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::InvalidEnv {
                        key: "WORKER_THREADS",
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            name: get("SERVER_NAME", "mcp-tool-server"),
            version: get("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
            transport,
            host: get("HOST", "0.0.0.0"),
            port,
            workers,
            tool_config_path: PathBuf::from(get("MCP_CONFIG", "kmcp.yaml")),
        })
    }

    /// HTTP worker count: the override, or CPU count capped at 16.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| num_cpus::get().clamp(1, 16))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    tools: HashMap<String, HashMap<String, Value>>,
}

/// Per-tool settings loaded from the YAML configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolConfig {
    tools: HashMap<String, HashMap<String, Value>>,
}

impl ToolConfig {
    /// Load tool settings from `path`.
    ///
    /// A missing file yields an empty configuration; a file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No tool config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read { path: path.to_path_buf(), source });
            }
        };
        Self::parse(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Parse YAML text. An empty document is an empty configuration.
    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: ConfigFile = serde_yaml::from_str(raw)?;
        Ok(Self { tools: file.tools })
    }

    /// One setting for one tool, if present.
    pub fn get(&self, tool_name: &str, key: &str) -> Option<&Value> {
        self.tools.get(tool_name)?.get(key)
    }

    /// A string setting for one tool.
    pub fn get_str(&self, tool_name: &str, key: &str) -> Option<&str> {
        self.get(tool_name, key)?.as_str()
    }
}
