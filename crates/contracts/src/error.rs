//! Layered error definitions
//!
//! Categorized by source: config / source / uplink / buffer / codec

use thiserror::Error;

/// Configuration and general-purpose error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A raw record could not be turned into a `RawFrame`.
///
/// Recoverable: the record is dropped and the pipeline continues.
#[derive(Debug, Error)]
#[error("record {line}: {message}")]
pub struct SourceParseError {
    /// 1-based line number in the source
    pub line: u64,
    pub message: String,
}

impl SourceParseError {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// POST failed or timed out.
///
/// Deliberately opaque: transport, DNS, timeout and non-2xx responses all
/// collapse into this one kind.
#[derive(Debug, Error)]
#[error("uplink '{uplink}' failed: {message}")]
pub struct UplinkError {
    pub uplink: String,
    pub message: String,
}

impl UplinkError {
    pub fn new(uplink: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            uplink: uplink.into(),
            message: message.into(),
        }
    }
}

/// Persistent storage failure
#[derive(Debug, Error)]
pub enum BufferError {
    /// Storage could not be opened or created (fatal at startup)
    #[error("cannot open buffer at '{path}': {message}")]
    Open { path: String, message: String },

    /// A single operation failed (recoverable)
    #[error("buffer {operation} failed: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl BufferError {
    pub fn open(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }
}

/// Stored or received bytes are not a valid `SparseFrame`
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Bytes are not a valid wire message
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Wire message violates `is_resync => all fields present`
    #[error("resync frame at {timestamp} is missing '{field}'")]
    IncompleteResync { timestamp: u64, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = UplinkError::new("http", "connection refused");
        assert_eq!(err.to_string(), "uplink 'http' failed: connection refused");

        let err = BufferError::storage("append", "disk full");
        assert_eq!(err.to_string(), "buffer append failed: disk full");

        let err = SourceParseError::new(7, "missing timestamp");
        assert_eq!(err.to_string(), "record 7: missing timestamp");

        let err = DecodeError::IncompleteResync {
            timestamp: 1000,
            field: "heading",
        };
        assert!(err.to_string().contains("heading"));
    }

    #[test]
    fn test_config_validation_error() {
        let err = ContractError::config_validation("vehicle.vin", "must be 17 characters");
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
        assert!(err.to_string().contains("vehicle.vin"));
    }
}
