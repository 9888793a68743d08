//! Configuration schema definitions.
//!
//! [`Options`] is the effective configuration handed to the engine. Every
//! field has a documented default so an empty config file and an empty
//! command line still produce a usable daemon.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;

/// Highest node id accepted (exclusive).
pub const MAX_NODE_ID: u64 = 1024;

/// Effective daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Unique part for message ids, in `[0, 1024)`.
    pub node_id: u64,

    /// Minimum level of emitted log events.
    pub log_level: LogLevel,

    /// Directory holding persisted metadata. Empty means the working directory.
    pub data_path: PathBuf,

    /// Address for TCP clients.
    pub tcp_address: String,

    /// Address for HTTP clients.
    pub http_address: String,

    /// Address for HTTPS clients.
    pub https_address: String,

    /// Address advertised to lookup services. Empty means the hostname.
    pub broadcast_address: String,

    /// Number of messages to keep in memory per topic/channel.
    pub mem_queue_size: u64,

    /// Maximum size of a single message in bytes.
    pub max_msg_size: u64,

    /// Maximum size of a single command body in bytes.
    pub max_body_size: u64,

    /// Default time a message may remain in flight.
    pub msg_timeout: Duration,

    /// Upper bound a client may request for a message timeout.
    pub max_msg_timeout: Duration,

    /// Number of messages per disk queue fsync.
    pub sync_every: u64,

    /// Duration between disk queue fsyncs.
    pub sync_timeout: Duration,

    /// Path to a PEM certificate for TLS listeners.
    pub tls_cert: Option<PathBuf>,

    /// Path to the PEM private key matching `tls_cert`.
    pub tls_key: Option<PathBuf>,

    /// Path to a certificate authority bundle for client verification.
    pub tls_root_ca_file: Option<PathBuf>,

    /// Whether clients must negotiate TLS.
    pub tls_required: TlsRequired,

    /// Minimum accepted TLS protocol version.
    pub tls_min_version: TlsMinVersion,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            node_id: 0,
            log_level: LogLevel::Info,
            data_path: PathBuf::new(),
            tcp_address: "0.0.0.0:4150".to_string(),
            http_address: "0.0.0.0:4151".to_string(),
            https_address: "0.0.0.0:4152".to_string(),
            broadcast_address: String::new(),
            mem_queue_size: 10_000,
            max_msg_size: 1024 * 1024,
            max_body_size: 5 * 1024 * 1024,
            msg_timeout: Duration::from_secs(60),
            max_msg_timeout: Duration::from_secs(15 * 60),
            sync_every: 2500,
            sync_timeout: Duration::from_secs(2),
            tls_cert: None,
            tls_key: None,
            tls_root_ca_file: None,
            tls_required: TlsRequired::Disabled,
            tls_min_version: TlsMinVersion::Tls10,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    ///
    /// `fatal` has no tracing equivalent and maps onto `error`.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Fatal => "error",
            other => other.as_str(),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client TLS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TlsRequired {
    /// TLS is optional for every client.
    #[value(name = "false")]
    Disabled,
    /// TLS is mandatory for TCP and HTTP clients.
    #[value(name = "true")]
    Required,
    /// TLS is mandatory for TCP clients; plain HTTP stays open.
    #[value(name = "tcp-https")]
    TcpHttps,
}

impl TlsRequired {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "false",
            Self::Required => "true",
            Self::TcpHttps => "tcp-https",
        }
    }

    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl FromStr for TlsRequired {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "false" | "" => Ok(Self::Disabled),
            "true" => Ok(Self::Required),
            "tcp-https" => Ok(Self::TcpHttps),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TlsRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum TlsMinVersion {
    #[value(name = "ssl3.0")]
    Ssl30,
    #[value(name = "tls1.0")]
    Tls10,
    #[value(name = "tls1.1")]
    Tls11,
    #[value(name = "tls1.2")]
    Tls12,
    #[value(name = "tls1.3")]
    Tls13,
}

impl TlsMinVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssl30 => "ssl3.0",
            Self::Tls10 => "tls1.0",
            Self::Tls11 => "tls1.1",
            Self::Tls12 => "tls1.2",
            Self::Tls13 => "tls1.3",
        }
    }
}

impl FromStr for TlsMinVersion {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ssl3.0" => Ok(Self::Ssl30),
            "tls1.0" => Ok(Self::Tls10),
            "tls1.1" => Ok(Self::Tls11),
            "tls1.2" => Ok(Self::Tls12),
            "tls1.3" => Ok(Self::Tls13),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TlsMinVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.tcp_address, "0.0.0.0:4150");
        assert_eq!(options.mem_queue_size, 10_000);
        assert_eq!(options.msg_timeout, Duration::from_secs(60));
        assert_eq!(options.tls_required, TlsRequired::Disabled);
        assert!(options.data_path.as_os_str().is_empty());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" fatal ".parse::<LogLevel>(), Ok(LogLevel::Fatal));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Fatal.filter_directive(), "error");
    }

    #[test]
    fn test_tls_values_round_trip_through_names() {
        for mode in [TlsRequired::Disabled, TlsRequired::Required, TlsRequired::TcpHttps] {
            assert_eq!(mode.as_str().parse::<TlsRequired>(), Ok(mode));
        }
        assert_eq!("tls1.2".parse::<TlsMinVersion>(), Ok(TlsMinVersion::Tls12));
        assert!("tls9".parse::<TlsMinVersion>().is_err());
    }
}
