//! Topic and channel metadata persistence.
//!
//! # Format
//! ```text
//! <data_path>/queued.dat (JSON)
//! {"version": "0.1.0", "topics": [{"name": "t", "paused": false, "channels": [...]}]}
//! ```
//!
//! # Design Decisions
//! - Writes go to a temp file, are fsynced, then renamed over the old file
//! - Ephemeral topics and channels are never written
//! - A missing file means a fresh data directory, not an error

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Metadata file name inside the data directory.
pub const METADATA_FILE: &str = "queued.dat";

/// Suffix marking topics and channels that live only in memory.
pub const EPHEMERAL_SUFFIX: &str = "#ephemeral";

const MAX_NAME_LENGTH: usize = 64;

/// Persisted engine metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub topics: Vec<TopicMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub name: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub channels: Vec<ChannelMetadata>,
}

impl TopicMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paused: false,
            channels: Vec::new(),
        }
    }

    pub fn with_channel(mut self, name: impl Into<String>, paused: bool) -> Self {
        self.channels.push(ChannelMetadata {
            name: name.into(),
            paused,
        });
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub name: String,
    #[serde(default)]
    pub paused: bool,
}

/// Path of the metadata file for a data directory.
pub fn metadata_path(data_dir: &Path) -> PathBuf {
    data_dir.join(METADATA_FILE)
}

/// Whether `name` is a valid topic or channel name.
pub fn is_valid_name(name: &str) -> bool {
    let base = name.strip_suffix(EPHEMERAL_SUFFIX).unwrap_or(name);
    !base.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

pub fn is_ephemeral(name: &str) -> bool {
    name.ends_with(EPHEMERAL_SUFFIX)
}

/// Read the metadata file, returning `None` when it does not exist.
pub fn read_metadata(path: &Path) -> Result<Option<Metadata>, EngineError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(EngineError::MetadataRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let metadata = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        EngineError::MetadataDecode {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(Some(metadata))
}

/// Atomically replace the metadata file.
pub fn write_metadata(path: &Path, metadata: &Metadata) -> Result<(), EngineError> {
    let tmp_path = path.with_extension("dat.tmp");
    let write_err = |source| EngineError::MetadataWrite {
        path: tmp_path.clone(),
        source,
    };

    let file = File::create(&tmp_path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, metadata).map_err(EngineError::MetadataEncode)?;
    writer.flush().map_err(write_err)?;
    let file = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    file.sync_all().map_err(write_err)?;

    fs::rename(&tmp_path, path).map_err(|source| EngineError::MetadataWrite {
        path: path.to_path_buf(),
        source,
    })
}
