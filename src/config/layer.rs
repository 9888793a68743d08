//! Partial configuration layers.
//!
//! A layer holds only the values one source set explicitly. `None` means
//! "not provided here" and never overrides a lower layer. The command line
//! parses straight into a layer; the config file is validated into one.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::config::schema::{LogLevel, Options, TlsMinVersion, TlsRequired};

/// Values explicitly provided by a single configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct OptionsLayer {
    /// Unique part for message ids, in [0, 1024)
    #[arg(long)]
    pub node_id: Option<u64>,

    /// Log verbosity
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Directory holding persisted metadata
    #[arg(long, value_name = "DIR")]
    pub data_path: Option<PathBuf>,

    /// <addr>:<port> to listen on for TCP clients
    #[arg(long)]
    pub tcp_address: Option<String>,

    /// <addr>:<port> to listen on for HTTP clients
    #[arg(long)]
    pub http_address: Option<String>,

    /// <addr>:<port> to listen on for HTTPS clients
    #[arg(long)]
    pub https_address: Option<String>,

    /// Address advertised to lookup services
    #[arg(long)]
    pub broadcast_address: Option<String>,

    /// Messages kept in memory per topic/channel
    #[arg(long)]
    pub mem_queue_size: Option<u64>,

    /// Maximum size of a single message in bytes
    #[arg(long)]
    pub max_msg_size: Option<u64>,

    /// Maximum size of a single command body in bytes
    #[arg(long)]
    pub max_body_size: Option<u64>,

    /// Default in-flight duration for a message (e.g. 60s)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub msg_timeout: Option<Duration>,

    /// Maximum in-flight duration a client may request
    #[arg(long, value_parser = humantime::parse_duration)]
    pub max_msg_timeout: Option<Duration>,

    /// Messages per disk queue fsync
    #[arg(long)]
    pub sync_every: Option<u64>,

    /// Duration between disk queue fsyncs
    #[arg(long, value_parser = humantime::parse_duration)]
    pub sync_timeout: Option<Duration>,

    /// Path to a PEM certificate
    #[arg(long, value_name = "FILE")]
    pub tls_cert: Option<PathBuf>,

    /// Path to a PEM private key
    #[arg(long, value_name = "FILE")]
    pub tls_key: Option<PathBuf>,

    /// Path to a certificate authority bundle
    #[arg(long, value_name = "FILE")]
    pub tls_root_ca_file: Option<PathBuf>,

    /// Client TLS policy
    #[arg(long, value_enum)]
    pub tls_required: Option<TlsRequired>,

    /// Minimum accepted TLS version
    #[arg(long, value_enum)]
    pub tls_min_version: Option<TlsMinVersion>,
}

impl OptionsLayer {
    /// Names of the options this layer sets, in declaration order.
    pub fn provided_keys(&self) -> Vec<&'static str> {
        let flags = [
            ("node_id", self.node_id.is_some()),
            ("log_level", self.log_level.is_some()),
            ("data_path", self.data_path.is_some()),
            ("tcp_address", self.tcp_address.is_some()),
            ("http_address", self.http_address.is_some()),
            ("https_address", self.https_address.is_some()),
            ("broadcast_address", self.broadcast_address.is_some()),
            ("mem_queue_size", self.mem_queue_size.is_some()),
            ("max_msg_size", self.max_msg_size.is_some()),
            ("max_body_size", self.max_body_size.is_some()),
            ("msg_timeout", self.msg_timeout.is_some()),
            ("max_msg_timeout", self.max_msg_timeout.is_some()),
            ("sync_every", self.sync_every.is_some()),
            ("sync_timeout", self.sync_timeout.is_some()),
            ("tls_cert", self.tls_cert.is_some()),
            ("tls_key", self.tls_key.is_some()),
            ("tls_root_ca_file", self.tls_root_ca_file.is_some()),
            ("tls_required", self.tls_required.is_some()),
            ("tls_min_version", self.tls_min_version.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(key, set)| set.then_some(key))
            .collect()
    }

    /// Apply every provided value on top of `options`.
    pub fn apply_to(self, options: &mut Options) {
        replace(&mut options.node_id, self.node_id);
        replace(&mut options.log_level, self.log_level);
        replace(&mut options.data_path, self.data_path);
        replace(&mut options.tcp_address, self.tcp_address);
        replace(&mut options.http_address, self.http_address);
        replace(&mut options.https_address, self.https_address);
        replace(&mut options.broadcast_address, self.broadcast_address);
        replace(&mut options.mem_queue_size, self.mem_queue_size);
        replace(&mut options.max_msg_size, self.max_msg_size);
        replace(&mut options.max_body_size, self.max_body_size);
        replace(&mut options.msg_timeout, self.msg_timeout);
        replace(&mut options.max_msg_timeout, self.max_msg_timeout);
        replace(&mut options.sync_every, self.sync_every);
        replace(&mut options.sync_timeout, self.sync_timeout);
        replace_optional(&mut options.tls_cert, self.tls_cert);
        replace_optional(&mut options.tls_key, self.tls_key);
        replace_optional(&mut options.tls_root_ca_file, self.tls_root_ca_file);
        replace(&mut options.tls_required, self.tls_required);
        replace(&mut options.tls_min_version, self.tls_min_version);
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn replace_optional<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
