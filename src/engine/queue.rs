//! Queue engine.
//!
//! # Responsibilities
//! - Check that the effective options are usable before anything starts
//! - Own the data directory (exclusive lock for the engine's lifetime)
//! - Restore and persist topic/channel metadata
//! - Block in `run` until a stop is requested, then flush metadata
//!
//! # Design Decisions
//! - Topic registry is a `DashMap` so `run`, `request_stop` and inspection
//!   never contend on a single lock
//! - Stop is a cancellation token: idempotent and observable from outside
//! - The data directory lock is released when the engine is dropped
//! - The final flush in `run` goes through `spawn_blocking`; fsync must not
//!   stall a runtime worker

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use fs2::FileExt;
use tokio_util::sync::CancellationToken;

use crate::config::schema::MAX_NODE_ID;
use crate::config::Options;
use crate::engine::metadata::{
    is_ephemeral, is_valid_name, metadata_path, read_metadata, write_metadata, ChannelMetadata,
    Metadata, TopicMetadata,
};
use crate::engine::{Engine, EngineError, EngineFactory};

/// Lock file guarding a data directory against concurrent daemons.
pub const LOCK_FILE: &str = "queued.lock";

#[derive(Debug, Clone, Default)]
struct TopicState {
    paused: bool,
    channels: BTreeMap<String, bool>,
}

/// Message engine backed by a metadata file in the data directory.
pub struct QueueEngine {
    options: Options,
    data_dir: PathBuf,
    topics: DashMap<String, TopicState>,
    cancel: CancellationToken,
    _lock: File,
}

impl QueueEngine {
    /// Validate `options`, lock the data directory and build the engine.
    pub fn new(options: Options) -> Result<Self, EngineError> {
        check_options(&options)?;

        let data_dir = resolve_data_dir(&options.data_path)?;
        let lock = lock_data_dir(&data_dir)?;

        tracing::info!(
            node_id = options.node_id,
            data_path = %data_dir.display(),
            tcp_address = %options.tcp_address,
            http_address = %options.http_address,
            "Engine constructed"
        );

        Ok(Self {
            options,
            data_dir,
            topics: DashMap::new(),
            cancel: CancellationToken::new(),
            _lock: lock,
        })
    }

    /// Add a topic (and its channels) to the registry.
    ///
    /// Channels are merged into an existing topic of the same name.
    pub fn register_topic(&self, topic: TopicMetadata) -> Result<(), EngineError> {
        if !is_valid_name(&topic.name) {
            return Err(EngineError::InvalidOptions(format!(
                "invalid topic name {:?}",
                topic.name
            )));
        }
        if let Some(channel) = topic.channels.iter().find(|c| !is_valid_name(&c.name)) {
            return Err(EngineError::InvalidOptions(format!(
                "invalid channel name {:?}",
                channel.name
            )));
        }

        let mut entry = self.topics.entry(topic.name).or_default();
        entry.paused = topic.paused;
        for channel in topic.channels {
            entry.channels.insert(channel.name, channel.paused);
        }
        Ok(())
    }

    /// Sorted snapshot of the registry, ephemeral entries included.
    pub fn topics(&self) -> Vec<TopicMetadata> {
        self.snapshot(true)
    }

    /// Metadata as it would be written to disk.
    fn metadata(&self) -> Metadata {
        Metadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            topics: self.snapshot(false),
        }
    }

    fn snapshot(&self, include_ephemeral: bool) -> Vec<TopicMetadata> {
        let mut topics: Vec<TopicMetadata> = self
            .topics
            .iter()
            .filter(|entry| include_ephemeral || !is_ephemeral(entry.key()))
            .map(|entry| TopicMetadata {
                name: entry.key().clone(),
                paused: entry.value().paused,
                channels: entry
                    .value()
                    .channels
                    .iter()
                    .filter(|(name, _)| include_ephemeral || !is_ephemeral(name))
                    .map(|(name, paused)| ChannelMetadata {
                        name: name.clone(),
                        paused: *paused,
                    })
                    .collect(),
            })
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        topics
    }
}

#[async_trait]
impl Engine for QueueEngine {
    fn load_state(&self) -> Result<(), EngineError> {
        let path = metadata_path(&self.data_dir);
        let Some(metadata) = read_metadata(&path)? else {
            tracing::info!(path = %path.display(), "No metadata file, starting fresh");
            return Ok(());
        };

        for topic in metadata.topics {
            if !is_valid_name(&topic.name) {
                tracing::warn!(topic = %topic.name, "Skipping creation of invalid topic");
                continue;
            }
            let mut state = TopicState {
                paused: topic.paused,
                channels: BTreeMap::new(),
            };
            for channel in topic.channels {
                if !is_valid_name(&channel.name) {
                    tracing::warn!(
                        topic = %topic.name,
                        channel = %channel.name,
                        "Skipping creation of invalid channel"
                    );
                    continue;
                }
                state.channels.insert(channel.name, channel.paused);
            }
            self.topics.insert(topic.name, state);
        }

        tracing::info!(
            path = %path.display(),
            topics = self.topics.len(),
            "Metadata loaded"
        );
        Ok(())
    }

    fn persist_state(&self) -> Result<(), EngineError> {
        let path = metadata_path(&self.data_dir);
        let metadata = self.metadata();
        write_metadata(&path, &metadata)?;

        tracing::info!(
            path = %path.display(),
            topics = metadata.topics.len(),
            "Metadata persisted"
        );
        Ok(())
    }

    async fn run(&self) -> Result<(), EngineError> {
        tracing::info!(
            tcp_address = %self.options.tcp_address,
            mem_queue_size = self.options.mem_queue_size,
            "Engine running"
        );

        self.cancel.cancelled().await;

        tracing::info!("Engine stopping, flushing metadata");
        let path = metadata_path(&self.data_dir);
        let metadata = self.metadata();
        let topics = metadata.topics.len();
        tokio::task::spawn_blocking(move || write_metadata(&path, &metadata))
            .await
            .map_err(|e| EngineError::Internal(format!("metadata flush task failed - {e}")))??;

        tracing::info!(topics, "Metadata flushed");
        Ok(())
    }

    fn request_stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Engine stop requested");
        }
        self.cancel.cancel();
    }

    fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Factory building [`QueueEngine`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueEngineFactory;

impl EngineFactory for QueueEngineFactory {
    type Engine = QueueEngine;

    fn construct(&self, options: Options) -> Result<QueueEngine, EngineError> {
        QueueEngine::new(options)
    }
}

/// Structural checks a config file cannot express on its own.
fn check_options(options: &Options) -> Result<(), EngineError> {
    if options.node_id >= MAX_NODE_ID {
        return Err(EngineError::InvalidOptions(format!(
            "node_id must be in [0,{MAX_NODE_ID}), got {}",
            options.node_id
        )));
    }

    match (&options.tls_cert, &options.tls_key) {
        (Some(_), None) | (None, Some(_)) => {
            return Err(EngineError::InvalidOptions(
                "tls_cert and tls_key must be set together".to_string(),
            ));
        }
        (None, None) if options.tls_required.is_enabled() => {
            return Err(EngineError::InvalidOptions(
                "cannot require TLS client connections without TLS key and cert".to_string(),
            ));
        }
        _ => {}
    }

    if options.msg_timeout > options.max_msg_timeout {
        return Err(EngineError::InvalidOptions(format!(
            "msg_timeout ({:?}) exceeds max_msg_timeout ({:?})",
            options.msg_timeout, options.max_msg_timeout
        )));
    }

    let addresses = [
        ("tcp_address", &options.tcp_address),
        ("http_address", &options.http_address),
        ("https_address", &options.https_address),
    ];
    for (i, (name, address)) in addresses.iter().enumerate() {
        if let Some((other, _)) = addresses[i + 1..].iter().find(|(_, a)| a == address) {
            return Err(EngineError::InvalidOptions(format!(
                "{name} and {other} both use {address}"
            )));
        }
    }

    Ok(())
}

fn resolve_data_dir(data_path: &Path) -> Result<PathBuf, EngineError> {
    let dir = if data_path.as_os_str().is_empty() {
        std::env::current_dir().map_err(|source| EngineError::DataPath {
            path: data_path.to_path_buf(),
            source,
        })?
    } else {
        data_path.to_path_buf()
    };

    let metadata = std::fs::metadata(&dir).map_err(|source| EngineError::DataPath {
        path: dir.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(EngineError::DataPath {
            path: dir,
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }
    Ok(dir)
}

fn lock_data_dir(data_dir: &Path) -> Result<File, EngineError> {
    let lock_path = data_dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|source| EngineError::DataPath {
            path: lock_path.clone(),
            source,
        })?;
    file.try_lock_exclusive()
        .map_err(|source| EngineError::DataPathInUse {
            path: data_dir.to_path_buf(),
            source,
        })?;
    Ok(file)
}
