//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::layer::OptionsLayer;
use crate::config::validation::{validate_file, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {} - {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {} - {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file {} - {}", path.display(), join_errors(errors))]
    Validation {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw contents of a config file, before validation.
///
/// Enumerated options stay as text here so that validation can report every
/// unrecognised value at once instead of failing on the first serde error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub node_id: Option<u64>,
    pub log_level: Option<String>,
    pub data_path: Option<PathBuf>,
    pub tcp_address: Option<String>,
    pub http_address: Option<String>,
    pub https_address: Option<String>,
    pub broadcast_address: Option<String>,
    pub mem_queue_size: Option<u64>,
    pub max_msg_size: Option<u64>,
    pub max_body_size: Option<u64>,
    #[serde(with = "humantime_serde")]
    pub msg_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub max_msg_timeout: Option<Duration>,
    pub sync_every: Option<u64>,
    #[serde(with = "humantime_serde")]
    pub sync_timeout: Option<Duration>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub tls_root_ca_file: Option<PathBuf>,
    pub tls_required: Option<RawTlsRequired>,
    pub tls_min_version: Option<String>,
}

/// `tls_required` may be written as a TOML boolean or as a mode name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawTlsRequired {
    Flag(bool),
    Mode(String),
}

/// Parse config file contents without validating them.
pub fn parse_config(content: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load, parse and validate a config file into a layer.
pub fn load_layer(path: &Path) -> Result<OptionsLayer, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let layer = validate_file(raw).map_err(|errors| ConfigError::Validation {
        path: path.to_path_buf(),
        errors,
    })?;

    tracing::debug!(
        path = %path.display(),
        keys = ?layer.provided_keys(),
        "Config file loaded"
    );
    Ok(layer)
}
