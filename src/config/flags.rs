//! Command-line surface of the daemon.

use std::path::PathBuf;

use clap::Parser;

use crate::config::layer::OptionsLayer;

#[derive(Debug, Clone, Parser)]
#[command(name = "queued")]
#[command(about = "Message queue daemon", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print version string and exit
    #[arg(long)]
    pub version: bool,

    #[command(flatten)]
    pub overrides: OptionsLayer,
}

/// Name the daemon reports itself as.
pub const DAEMON_NAME: &str = "queued";

/// Human-readable version string printed by `--version`.
pub fn version_string() -> String {
    format!("{DAEMON_NAME} v{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unset_flags_stay_empty() {
        let cli = Cli::parse_from(["queued"]);
        assert!(cli.config.is_none());
        assert!(!cli.version);
        assert_eq!(cli.overrides, OptionsLayer::default());
    }

    #[test]
    fn test_explicit_flags_are_captured() {
        let cli = Cli::parse_from([
            "queued",
            "--config",
            "/etc/queued.toml",
            "--tcp-address",
            "127.0.0.1:4150",
            "--msg-timeout",
            "2m",
            "--tls-required",
            "tcp-https",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/queued.toml")));
        assert_eq!(cli.overrides.tcp_address.as_deref(), Some("127.0.0.1:4150"));
        assert_eq!(cli.overrides.msg_timeout, Some(Duration::from_secs(120)));
        assert_eq!(
            cli.overrides.provided_keys(),
            vec!["tcp_address", "msg_timeout", "tls_required"]
        );
    }

    #[test]
    fn test_log_level_flag_accepts_file_spellings() {
        use crate::config::LogLevel;

        for spelling in ["warn", "warning"] {
            let cli = Cli::parse_from(["queued", "--log-level", spelling]);
            assert_eq!(cli.overrides.log_level, Some(LogLevel::Warn));
            assert_eq!(spelling.parse::<LogLevel>(), Ok(LogLevel::Warn));
        }
    }

    #[test]
    fn test_version_flag() {
        let cli = Cli::parse_from(["queued", "--version"]);
        assert!(cli.version);
        assert!(version_string().starts_with("queued v"));
    }
}
