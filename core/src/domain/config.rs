// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// FileVault Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) covering:
// - Server bind address, port and storage root
// - Admission pool capacities
// - Chunk size
// - Client connection defaults
// - Logging level

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::admission::{AdmissionLimits, DEFAULT_LIST_CAPACITY, DEFAULT_TRANSFER_CAPACITY};
use crate::domain::chunk::DEFAULT_CHUNK_SIZE;

pub const API_VERSION: &str = "filevault/v1";
pub const KIND: &str = "FileVaultConfig";

/// Largest configurable chunk. Server and client raise their gRPC message
/// limits so that one such chunk plus framing fits in a message.
pub const MAX_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVaultConfig {
    /// API version (must be "filevault/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "FileVaultConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    pub spec: FileVaultSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Human-readable instance name
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileVaultSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// gRPC port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Flat directory holding every stored file
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    /// Serialize concurrent uploads that target the same name.
    /// When false, their appends may interleave.
    #[serde(default = "default_true")]
    pub serialize_writes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Concurrent ListFiles calls
    #[serde(default = "default_list_capacity")]
    pub list_capacity: usize,

    /// Concurrent Upload + Download calls
    #[serde(default = "default_transfer_capacity")]
    pub transfer_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Bytes per chunk for downloads (server) and uploads (client)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address the CLI connects to
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Connection setup timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./uploaded_files")
}

fn default_list_capacity() -> usize {
    DEFAULT_LIST_CAPACITY
}

fn default_transfer_capacity() -> usize {
    DEFAULT_TRANSFER_CAPACITY
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_server_address() -> String {
    "localhost:50051".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            storage_root: default_storage_root(),
            serialize_writes: default_true(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            list_capacity: default_list_capacity(),
            transfer_capacity: default_transfer_capacity(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for FileVaultConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "filevault".to_string(),
            },
            spec: FileVaultSpec::default(),
        }
    }
}

impl LimitsConfig {
    pub fn admission_limits(&self) -> AdmissionLimits {
        AdmissionLimits {
            list: self.list_capacity,
            transfer: self.transfer_capacity,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl ServerConfig {
    /// `bind_address:port` as a socket address string
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl FileVaultConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate paths in discovery order
    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var("FILEVAULT_CONFIG_PATH") {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./filevault.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".filevault").join("config.yaml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/filevault/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\FileVault\\config.yaml"));

        paths
    }

    /// Discover configuration file using precedence order
    /// 1. FILEVAULT_CONFIG_PATH environment variable
    /// 2. ./filevault.yaml (working directory)
    /// 3. ~/.filevault/config.yaml (user home)
    /// 4. /etc/filevault/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FILEVAULT_STORAGE_ROOT") {
            tracing::info!("Environment override: FILEVAULT_STORAGE_ROOT={}", val);
            self.spec.server.storage_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FILEVAULT_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: FILEVAULT_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for FILEVAULT_PORT: '{}'. Ignoring.", val);
                }
            }
        }

        if let Ok(val) = std::env::var("FILEVAULT_SERIALIZE_WRITES") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: FILEVAULT_SERIALIZE_WRITES=true");
                    self.spec.server.serialize_writes = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: FILEVAULT_SERIALIZE_WRITES=false");
                    self.spec.server.serialize_writes = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for FILEVAULT_SERIALIZE_WRITES: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.storage_root.as_os_str().is_empty() {
            anyhow::bail!("spec.server.storage_root cannot be empty");
        }

        if self.spec.limits.list_capacity == 0 {
            anyhow::bail!("spec.limits.list_capacity must be at least 1");
        }

        if self.spec.limits.transfer_capacity == 0 {
            anyhow::bail!("spec.limits.transfer_capacity must be at least 1");
        }

        let chunk_size = self.spec.transfer.chunk_size;
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "spec.transfer.chunk_size must be between 1 and {} bytes, got {}",
                MAX_CHUNK_SIZE,
                chunk_size
            );
        }

        Ok(())
    }
}
