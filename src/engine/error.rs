use std::path::PathBuf;

use thiserror::Error;

/// Errors reported across the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine options: {0}")]
    InvalidOptions(String),

    #[error("data path {} is unusable: {source}", path.display())]
    DataPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data path {} in use (possibly by another instance)", path.display())]
    DataPathInUse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read metadata file {}: {source}", path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode metadata file {}: {source}", path.display())]
    MetadataDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write metadata file {}: {source}", path.display())]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode metadata: {0}")]
    MetadataEncode(#[source] serde_json::Error),

    #[error("engine failure: {0}")]
    Internal(String),
}
