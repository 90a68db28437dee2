// Error types for CertGraph
//
// Structured error taxonomy for chain extraction, tree persistence and merging.
// Thumbprint collisions and depth truncation are not errors: they are reported
// on the merge report and the merge proceeds.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for CertGraph operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// TCP connection was refused or reset
    #[error("Connection to {target} failed: {reason}")]
    ConnectionFailure { target: String, reason: String },

    /// Connection attempt exceeded the configured timeout
    #[error("Connection timeout after {duration:?} to {target}")]
    ConnectionTimeout { duration: Duration, target: String },

    /// DNS resolution failed for the hostname
    #[error("DNS resolution failed for {hostname}: {reason}")]
    DnsResolutionFailed { hostname: String, reason: String },

    /// Hostname could not be turned into a usable URI
    #[error("Invalid target {input}: {reason}")]
    InvalidTarget { input: String, reason: String },

    /// TLS negotiation failed
    #[error("TLS handshake with {target} failed: {details}")]
    HandshakeFailure { target: String, details: String },

    /// Handshake completed but the peer offered no certificate
    #[error("No certificates received from {target}")]
    NoPeerCertificates { target: String },

    /// Merge was asked to ingest a chain with no certificates
    #[error("Certificate chain is empty")]
    EmptyChain,

    /// Chain root does not match the tree it was merged into
    #[error("Chain root {found} does not match tree root {expected}")]
    RootMismatch { expected: String, found: String },

    /// Persisted tree document could not be parsed
    #[error("Malformed certificate tree {path}: {source}")]
    MalformedPersistedTree {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File system errors
    #[error("File system error: {path}: {source}")]
    FileSystemError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },

    /// Invalid input from user or input files
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Certificate could not be decoded
    #[error("Certificate parsing error: {details}")]
    CertificateParse { details: String },

    /// Generic I/O error
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// OpenSSL-specific errors
    #[error("OpenSSL error: {0}")]
    OpenSslError(#[from] openssl::error::ErrorStack),

    /// Serialization errors outside of tree loading
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl GraphError {
    /// Whether this error only affects the host being processed.
    ///
    /// Host-level failures are counted and skipped by the ingest loop; anything
    /// else aborts the run.
    pub fn is_host_failure(&self) -> bool {
        matches!(
            self,
            GraphError::ConnectionFailure { .. }
                | GraphError::ConnectionTimeout { .. }
                | GraphError::DnsResolutionFailed { .. }
                | GraphError::InvalidTarget { .. }
                | GraphError::HandshakeFailure { .. }
                | GraphError::NoPeerCertificates { .. }
                | GraphError::CertificateParse { .. }
                | GraphError::MalformedPersistedTree { .. }
        )
    }
}

impl From<toml::de::Error> for GraphError {
    fn from(err: toml::de::Error) -> Self {
        GraphError::ConfigError {
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for GraphError {
    fn from(err: toml::ser::Error) -> Self {
        GraphError::ConfigError {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for GraphError {
    fn from(err: tokio::task::JoinError) -> Self {
        GraphError::Other(format!("Task join error: {}", err))
    }
}
