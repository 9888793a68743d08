//! Configuration validation.
//!
//! # Responsibilities
//! - Convert textual enumerations into typed values
//! - Validate value ranges (node id, non-zero durations)
//! - Check values that only make sense together (message vs body size)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FileConfig → Result<OptionsLayer, Vec<ValidationError>>
//! - Runs before the file is merged, so an invalid file never partially applies

use std::time::Duration;

use thiserror::Error;

use crate::config::layer::OptionsLayer;
use crate::config::loader::{FileConfig, RawTlsRequired};
use crate::config::schema::{LogLevel, TlsMinVersion, TlsRequired, MAX_NODE_ID};

/// A single problem found in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{key} has unrecognised value {value:?} (expected one of: {expected})")]
    UnknownValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{key} = {value} is out of range (must be < {limit})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        limit: u64,
    },

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: &'static str },

    #[error("max_msg_size ({max_msg_size}) exceeds max_body_size ({max_body_size})")]
    MessageExceedsBody { max_msg_size: u64, max_body_size: u64 },
}

/// Validate a parsed config file and convert it into a layer.
pub fn validate_file(raw: FileConfig) -> Result<OptionsLayer, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let log_level = raw.log_level.as_deref().and_then(|value| {
        parse_or_record::<LogLevel>(
            &mut errors,
            "log_level",
            value,
            "debug, info, warn, error, fatal",
        )
    });

    let tls_required = raw.tls_required.and_then(|value| match value {
        RawTlsRequired::Flag(true) => Some(TlsRequired::Required),
        RawTlsRequired::Flag(false) => Some(TlsRequired::Disabled),
        RawTlsRequired::Mode(mode) => parse_or_record::<TlsRequired>(
            &mut errors,
            "tls_required",
            &mode,
            "true, false, tcp-https",
        ),
    });

    let tls_min_version = raw.tls_min_version.as_deref().and_then(|value| {
        parse_or_record::<TlsMinVersion>(
            &mut errors,
            "tls_min_version",
            value,
            "ssl3.0, tls1.0, tls1.1, tls1.2, tls1.3",
        )
    });

    if let Some(node_id) = raw.node_id {
        if node_id >= MAX_NODE_ID {
            errors.push(ValidationError::OutOfRange {
                key: "node_id",
                value: node_id,
                limit: MAX_NODE_ID,
            });
        }
    }

    check_non_zero(&mut errors, "msg_timeout", raw.msg_timeout);
    check_non_zero(&mut errors, "max_msg_timeout", raw.max_msg_timeout);
    check_non_zero(&mut errors, "sync_timeout", raw.sync_timeout);

    if let (Some(max_msg_size), Some(max_body_size)) = (raw.max_msg_size, raw.max_body_size) {
        if max_msg_size > max_body_size {
            errors.push(ValidationError::MessageExceedsBody {
                max_msg_size,
                max_body_size,
            });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(OptionsLayer {
        node_id: raw.node_id,
        log_level,
        data_path: raw.data_path,
        tcp_address: raw.tcp_address,
        http_address: raw.http_address,
        https_address: raw.https_address,
        broadcast_address: raw.broadcast_address,
        mem_queue_size: raw.mem_queue_size,
        max_msg_size: raw.max_msg_size,
        max_body_size: raw.max_body_size,
        msg_timeout: raw.msg_timeout,
        max_msg_timeout: raw.max_msg_timeout,
        sync_every: raw.sync_every,
        sync_timeout: raw.sync_timeout,
        tls_cert: raw.tls_cert,
        tls_key: raw.tls_key,
        tls_root_ca_file: raw.tls_root_ca_file,
        tls_required,
        tls_min_version,
    })
}

fn parse_or_record<T: std::str::FromStr>(
    errors: &mut Vec<ValidationError>,
    key: &'static str,
    value: &str,
    expected: &'static str,
) -> Option<T> {
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(ValidationError::UnknownValue {
                key,
                value: value.to_string(),
                expected,
            });
            None
        }
    }
}

fn check_non_zero(errors: &mut Vec<ValidationError>, key: &'static str, value: Option<Duration>) {
    if value == Some(Duration::ZERO) {
        errors.push(ValidationError::ZeroDuration { key });
    }
}
