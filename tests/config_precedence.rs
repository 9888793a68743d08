//! Option resolution through the real command-line and file layers.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{cli, write_config};
use queue_daemon::config::{
    load_options, ConfigError, LogLevel, Options, TlsMinVersion, TlsRequired, ValidationError,
};

const FILE: &str = r#"
log_level = "debug"
tcp_address = "127.0.0.1:5150"
http_address = "127.0.0.1:5151"
mem_queue_size = 500
msg_timeout = "90s"
tls_required = true
tls_min_version = "tls1.2"
"#;

#[test]
fn test_no_file_no_flags_yields_defaults() {
    let options = load_options(&cli(&[])).unwrap();
    assert_eq!(options, Options::default());
}

#[test]
fn test_file_values_beat_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), FILE);

    let options = load_options(&cli(&["--config", path.to_str().unwrap()])).unwrap();

    assert_eq!(options.log_level, LogLevel::Debug);
    assert_eq!(options.tcp_address, "127.0.0.1:5150");
    assert_eq!(options.mem_queue_size, 500);
    assert_eq!(options.msg_timeout, Duration::from_secs(90));
    assert_eq!(options.tls_required, TlsRequired::Required);
    assert_eq!(options.tls_min_version, TlsMinVersion::Tls12);
    // Untouched keys keep their defaults.
    assert_eq!(options.sync_every, Options::default().sync_every);
    assert_eq!(options.https_address, Options::default().https_address);
}

#[test]
fn test_explicit_flags_beat_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), FILE);

    let options = load_options(&cli(&[
        "--config",
        path.to_str().unwrap(),
        "--tcp-address",
        "0.0.0.0:6150",
        "--msg-timeout",
        "30s",
        "--tls-required",
        "false",
    ]))
    .unwrap();

    assert_eq!(options.tcp_address, "0.0.0.0:6150");
    assert_eq!(options.msg_timeout, Duration::from_secs(30));
    assert_eq!(options.tls_required, TlsRequired::Disabled);
    // File still wins where no flag was given.
    assert_eq!(options.http_address, "127.0.0.1:5151");
    assert_eq!(options.mem_queue_size, 500);
}

#[test]
fn test_flag_equal_to_default_still_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), FILE);
    let default_size = Options::default().mem_queue_size.to_string();

    let options = load_options(&cli(&[
        "--config",
        path.to_str().unwrap(),
        "--mem-queue-size",
        &default_size,
    ]))
    .unwrap();

    assert_eq!(options.mem_queue_size, Options::default().mem_queue_size);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("absent.toml");

    let err = load_options(&cli(&["--config", path.to_str().unwrap()])).unwrap_err();

    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "tcp_address = [");

    let err = load_options(&cli(&["--config", path.to_str().unwrap()])).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_invalid_values_are_all_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "tls_min_version = \"tls9\"\nmax_msg_size = 10\nmax_body_size = 5\n",
    );

    let err = load_options(&cli(&["--config", path.to_str().unwrap()])).unwrap_err();

    let errors = match err {
        ConfigError::Validation { errors, .. } => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::UnknownValue { key: "tls_min_version", .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::MessageExceedsBody { .. })));
}
